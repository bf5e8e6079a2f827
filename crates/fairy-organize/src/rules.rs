//! Rule table: categories, rename templates and excludes.
//!
//! Rules live in a TOML file:
//!
//! ```toml
//! exclude = [".git", "node_modules"]
//!
//! [move]
//! fallback = "Others"
//!
//! [[move.categories]]
//! name = "Documents"
//! extensions = [".pdf", ".txt"]
//!
//! [[rename]]
//! extensions = [".txt"]
//! pattern = "{{date_created}}_{{original_name}}{{ext}}"
//!
//! [rename_ai]
//! extensions = [".txt"]
//! pattern = "{{original_name}}_{{keywords}}{{ext}}"
//! ```
//!
//! Extensions are normalized on load, so `TXT`, `.txt` and `txt` are the same.

use fairy_core::{normalize_extension, RuleError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::naming::is_safe_component;

/// Default rules file name.
pub const RULES_FILE_NAME: &str = "rules.toml";

/// Default operation log file name.
pub const LOG_FILE_NAME: &str = "fairy.log";

/// A category folder and the extensions routed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Ordered categories plus a fallback. The first matching category wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRule {
    pub fallback: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Rename template for a set of extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    pub extensions: Vec<String>,
    pub pattern: String,
}

/// Extensions eligible for AI keyword renaming and the template used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRenameRule {
    pub extensions: Vec<String>,
    #[serde(default = "default_ai_pattern")]
    pub pattern: String,
}

fn default_ai_pattern() -> String {
    "{{original_name}}_{{keywords}}{{ext}}".to_string()
}

fn default_excludes() -> Vec<String> {
    [
        ".git",
        ".DS_Store",
        "node_modules",
        "venv",
        RULES_FILE_NAME,
        LOG_FILE_NAME,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// The complete rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// File and directory names never organized (exact match)
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    #[serde(rename = "move")]
    pub move_rule: MoveRule,

    /// Checked in order; the first rule listing the extension wins
    #[serde(default)]
    pub rename: Vec<RenameRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_ai: Option<AiRenameRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        let category = |name: &str, exts: &[&str]| Category {
            name: name.to_string(),
            extensions: exts.iter().map(|e| e.to_string()).collect(),
        };

        Self {
            exclude: default_excludes(),
            move_rule: MoveRule {
                fallback: "Others".to_string(),
                categories: vec![
                    category("Documents", &[".pdf", ".docx", ".pptx", ".hwp", ".txt", ".md"]),
                    category("Images", &[".jpg", ".jpeg", ".png", ".gif"]),
                    category("Data", &[".csv", ".xlsx", ".json"]),
                    category("Archives", &[".zip", ".7z", ".rar"]),
                ],
            },
            rename: vec![
                RenameRule {
                    extensions: vec![".txt".to_string(), ".md".to_string()],
                    pattern: "{{date_created}}_{{original_name}}{{ext}}".to_string(),
                },
                RenameRule {
                    extensions: vec![".jpg".to_string(), ".png".to_string()],
                    pattern: "IMG_{{date_created}}_{{original_name}}{{ext}}".to_string(),
                },
            ],
            rename_ai: Some(AiRenameRule {
                extensions: vec![".txt".to_string(), ".md".to_string()],
                pattern: default_ai_pattern(),
            }),
        }
    }
}

fn normalize_all(exts: &mut Vec<String>) {
    for ext in exts.iter_mut() {
        *ext = normalize_extension(ext);
    }
    exts.retain(|e| !e.is_empty());
}

fn check_pattern(pattern: &str) -> Result<(), RuleError> {
    if pattern.trim().is_empty() {
        return Err(RuleError::Invalid("rename pattern is empty".to_string()));
    }
    if pattern.contains(['/', '\\']) {
        return Err(RuleError::Invalid(format!(
            "rename pattern must not contain path separators: {pattern}"
        )));
    }
    Ok(())
}

impl RuleTable {
    /// Parse, normalize and validate a rule table.
    pub fn from_toml(text: &str) -> Result<Self, RuleError> {
        let mut table: RuleTable =
            toml::from_str(text).map_err(|e| RuleError::Parse(e.to_string()))?;
        table.normalize();
        table.validate()?;
        Ok(table)
    }

    /// Load a rules file.
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let text = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_toml(&text)?;
        info!("Loaded rules from {}", path.display());
        Ok(table)
    }

    /// Load `path` when it exists, otherwise the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, RuleError> {
        if path.is_file() {
            Self::load(path)
        } else {
            debug!("No rules file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String, RuleError> {
        toml::to_string_pretty(self).map_err(|e| RuleError::Parse(e.to_string()))
    }

    /// Lower-case every extension and give it a leading dot.
    pub fn normalize(&mut self) {
        for category in &mut self.move_rule.categories {
            normalize_all(&mut category.extensions);
        }
        for rule in &mut self.rename {
            normalize_all(&mut rule.extensions);
        }
        if let Some(rule) = &mut self.rename_ai {
            normalize_all(&mut rule.extensions);
        }
    }

    /// Check the invariants of the table.
    pub fn validate(&self) -> Result<(), RuleError> {
        let fallback = &self.move_rule.fallback;
        if fallback.trim().is_empty() {
            return Err(RuleError::Invalid("fallback category is empty".to_string()));
        }
        if !is_safe_component(fallback) {
            return Err(RuleError::Invalid(format!(
                "fallback category is not a single folder name: {fallback:?}"
            )));
        }

        for category in &self.move_rule.categories {
            if !is_safe_component(&category.name) {
                return Err(RuleError::Invalid(format!(
                    "category is not a single folder name: {:?}",
                    category.name
                )));
            }
            if &category.name == fallback {
                return Err(RuleError::Invalid(format!(
                    "fallback {fallback:?} is also a declared category"
                )));
            }
        }

        for rule in &self.rename {
            check_pattern(&rule.pattern)?;
        }
        if let Some(rule) = &self.rename_ai {
            check_pattern(&rule.pattern)?;
        }
        Ok(())
    }

    /// Category for a normalized extension.
    pub fn category_for(&self, ext: &str) -> &str {
        self.move_rule
            .categories
            .iter()
            .find(|c| c.extensions.iter().any(|e| e == ext))
            .map_or(self.move_rule.fallback.as_str(), |c| c.name.as_str())
    }

    /// First rename rule listing `ext`.
    pub fn rename_rule_for(&self, ext: &str) -> Option<&RenameRule> {
        self.rename
            .iter()
            .find(|r| r.extensions.iter().any(|e| e == ext))
    }

    pub fn ai_rename_for(&self, ext: &str) -> Option<&AiRenameRule> {
        self.rename_ai
            .as_ref()
            .filter(|r| r.extensions.iter().any(|e| e == ext))
    }

    /// Every category label including the fallback, in declaration order.
    pub fn category_names(&self) -> Vec<String> {
        self.move_rule
            .categories
            .iter()
            .map(|c| c.name.clone())
            .chain(std::iter::once(self.move_rule.fallback.clone()))
            .collect()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
[move]
fallback = "Other"

[[move.categories]]
name = "Docs"
extensions = ["TXT", "md"]
"#;

    #[test]
    fn test_defaults_are_valid() {
        let rules = RuleTable::default();
        rules.validate().unwrap();
        assert_eq!(rules.category_for(".pdf"), "Documents");
        assert_eq!(rules.category_for(".exe"), "Others");
        assert_eq!(rules.category_for(""), "Others");
    }

    #[test]
    fn test_extensions_normalized_on_load() {
        let rules = RuleTable::from_toml(MINIMAL).unwrap();
        assert_eq!(rules.move_rule.categories[0].extensions, vec![".txt", ".md"]);
        assert_eq!(rules.category_for(".txt"), "Docs");
        assert_eq!(rules.category_for(".png"), "Other");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let rules = RuleTable::from_toml(MINIMAL).unwrap();
        assert!(rules.rename.is_empty());
        assert!(rules.rename_ai.is_none());
        assert!(rules.is_excluded(".git"));
        assert!(rules.is_excluded(RULES_FILE_NAME));
    }

    #[test]
    fn test_first_rename_rule_wins() {
        let text = r#"
[move]
fallback = "Other"

[[rename]]
extensions = [".txt"]
pattern = "first_{{original_name}}{{ext}}"

[[rename]]
extensions = ["txt"]
pattern = "second_{{original_name}}{{ext}}"
"#;
        let rules = RuleTable::from_toml(text).unwrap();
        assert_eq!(
            rules.rename_rule_for(".txt").unwrap().pattern,
            "first_{{original_name}}{{ext}}"
        );
        assert!(rules.rename_rule_for(".md").is_none());
    }

    #[test]
    fn test_ai_rename_default_pattern() {
        let text = r#"
[move]
fallback = "Other"

[rename_ai]
extensions = ["TXT"]
"#;
        let rules = RuleTable::from_toml(text).unwrap();
        let ai = rules.ai_rename_for(".txt").unwrap();
        assert_eq!(ai.pattern, "{{original_name}}_{{keywords}}{{ext}}");
        assert!(rules.ai_rename_for(".md").is_none());
    }

    #[test]
    fn test_invalid_tables_rejected() {
        let empty_fallback = "[move]\nfallback = \"\"\n";
        assert!(matches!(
            RuleTable::from_toml(empty_fallback),
            Err(RuleError::Invalid(_))
        ));

        let fallback_is_category = r#"
[move]
fallback = "Docs"
[[move.categories]]
name = "Docs"
extensions = [".txt"]
"#;
        assert!(matches!(
            RuleTable::from_toml(fallback_is_category),
            Err(RuleError::Invalid(_))
        ));

        let nested_category = r#"
[move]
fallback = "Other"
[[move.categories]]
name = "a/b"
extensions = [".txt"]
"#;
        assert!(matches!(
            RuleTable::from_toml(nested_category),
            Err(RuleError::Invalid(_))
        ));

        let dotdot = "[move]\nfallback = \"..\"\n";
        assert!(RuleTable::from_toml(dotdot).is_err());

        let bad_pattern = r#"
[move]
fallback = "Other"
[[rename]]
extensions = [".txt"]
pattern = "../{{original_name}}{{ext}}"
"#;
        assert!(RuleTable::from_toml(bad_pattern).is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            RuleTable::from_toml("this is = = not toml"),
            Err(RuleError::Parse(_))
        ));
        assert!(matches!(
            RuleTable::from_toml("exclude = []"),
            Err(RuleError::Parse(_))
        ));
    }

    #[test]
    fn test_round_trip_defaults_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RULES_FILE_NAME);
        std::fs::write(&path, RuleTable::default().to_toml().unwrap()).unwrap();

        assert_eq!(RuleTable::load(&path).unwrap(), RuleTable::default());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(RuleTable::load_or_default(&missing).unwrap(), RuleTable::default());

        assert!(matches!(
            RuleTable::load(&missing),
            Err(RuleError::Read { .. })
        ));
    }

    #[test]
    fn test_category_names_include_fallback() {
        let rules = RuleTable::from_toml(MINIMAL).unwrap();
        assert_eq!(rules.category_names(), vec!["Docs", "Other"]);
    }
}
