//! Organize planner.
//!
//! Computes the complete rename-and-move plan for a directory before anything
//! changes on disk. Per file:
//!
//! 1. name: AI filename, else AI keywords (`rename_ai` template), else the
//!    first matching rename rule, else unchanged
//! 2. folder: AI classification when it has an opinion, else the first
//!    category listing the extension, else the fallback
//! 3. destination clashes get `_1`, `_2`, ... before the extension
//!
//! AI calls for different files run concurrently but the plan keeps scan
//! order. Files over the size limit never reach the suggester, and long
//! documents are reduced to their key chunks first when a
//! [`KeyChunkSelector`] is attached.

use chrono::Local;
use fairy_core::{ChangeEntry, Error, FileEntry, NameSource, Result, Suggester};
use fairy_extract::ExtractorRegistry;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::key_chunks::KeyChunkSelector;
use crate::naming::{
    already_applied, original_suffix, render, sanitize_filename, sanitize_keywords,
    sanitize_label, with_suffix, TemplateVars,
};
use crate::rules::RuleTable;
use crate::scan::scan;

/// Which AI suggestions the planner asks for.
#[derive(Debug, Clone)]
pub struct AiOptions {
    pub keywords: bool,
    pub filename: bool,
    pub folder: bool,
    /// Files analysed at the same time
    pub concurrency: usize,
    /// Larger files use rule-based naming only
    pub max_file_size: Option<u64>,
}

impl Default for AiOptions {
    fn default() -> Self {
        Self {
            keywords: true,
            filename: false,
            folder: false,
            concurrency: 4,
            max_file_size: None,
        }
    }
}

impl AiOptions {
    fn any(&self) -> bool {
        self.keywords || self.filename || self.folder
    }
}

/// A computed plan. Nothing has been touched yet.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub root: PathBuf,
    /// In scan order, destinations unique
    pub entries: Vec<ChangeEntry>,
    /// Files that fell back to rule-based naming, with the reason
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// One `'from' -> 'to'` line per entry, relative to the root.
    pub fn preview_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "'{}' -> '{}'",
                    relative(&self.root, &e.from).display(),
                    relative(&self.root, &e.to).display()
                )
            })
            .collect()
    }
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Per-file decision before collision resolution.
struct Decision {
    from: PathBuf,
    name: String,
    name_source: NameSource,
    category: String,
    warnings: Vec<String>,
}

/// Builds plans from a rule table and an optional suggester.
pub struct Planner {
    rules: Arc<RuleTable>,
    extractors: Arc<ExtractorRegistry>,
    suggester: Option<Arc<dyn Suggester>>,
    key_chunks: Option<KeyChunkSelector>,
    ai: AiOptions,
}

impl Planner {
    /// Rule-based planner.
    pub fn new(rules: Arc<RuleTable>, extractors: Arc<ExtractorRegistry>) -> Self {
        Self {
            rules,
            extractors,
            suggester: None,
            key_chunks: None,
            ai: AiOptions::default(),
        }
    }

    /// Ask `suggester` for the suggestions enabled in `ai`.
    #[must_use]
    pub fn with_suggester(mut self, suggester: Arc<dyn Suggester>, ai: AiOptions) -> Self {
        self.suggester = Some(suggester);
        self.ai = ai;
        self
    }

    /// Send only the key chunks of long documents to the suggester.
    #[must_use]
    pub fn with_key_chunks(mut self, selector: KeyChunkSelector) -> Self {
        self.key_chunks = Some(selector);
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Plan the organization of `root`.
    pub async fn plan(&self, root: &Path, recursive: bool) -> Result<Plan> {
        let scan_root = root.to_path_buf();
        let exclude = self.rules.exclude.clone();
        let files = tokio::task::spawn_blocking(move || scan(&scan_root, recursive, &exclude))
            .await
            .map_err(|e| Error::Other(format!("scan task failed: {e}")))??;

        info!("Planning {} files under {:?}", files.len(), root);

        let concurrency = self.ai.concurrency.max(1);
        let decisions: Vec<Decision> = stream::iter(files.iter().map(|file| self.decide(file)))
            .buffered(concurrency)
            .collect()
            .await;

        let mut plan = Plan {
            root: root.to_path_buf(),
            ..Default::default()
        };
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for decision in decisions {
            plan.warnings.extend(decision.warnings);

            let dir = root.join(&decision.category);
            let mut to = dir.join(&decision.name);
            let mut n = 0;
            while to != decision.from && (claimed.contains(&to) || to.exists()) {
                n += 1;
                to = dir.join(with_suffix(&decision.name, n));
            }
            claimed.insert(to.clone());

            if to == decision.from {
                continue;
            }
            plan.entries.push(ChangeEntry {
                from: decision.from,
                to,
                category: decision.category,
                name_source: decision.name_source,
            });
        }

        debug!(
            "Plan has {} entries and {} warnings",
            plan.entries.len(),
            plan.warnings.len()
        );
        Ok(plan)
    }

    fn rule_name(&self, file: &FileEntry, vars: &TemplateVars<'_>) -> (String, NameSource) {
        let file_name = file.file_name();
        match self.rules.rename_rule_for(&file.extension) {
            Some(rule) if !already_applied(&rule.pattern, vars, &file_name) => {
                (render(&rule.pattern, vars), NameSource::Rule)
            }
            _ => (file_name, NameSource::Unchanged),
        }
    }

    /// The suggester, when at least one enabled suggestion applies to `file`.
    fn suggester_for(
        &self,
        file: &FileEntry,
        warnings: &mut Vec<String>,
    ) -> Option<&Arc<dyn Suggester>> {
        let suggester = self.suggester.as_ref()?;
        if !self.ai.any() {
            return None;
        }
        let keywords = self.ai.keywords && self.rules.ai_rename_for(&file.extension).is_some();
        if !(keywords || self.ai.filename || self.ai.folder) {
            return None;
        }
        if !self.extractors.supports(&file.path) {
            debug!("No extractor for {:?}, using rules", file.path);
            return None;
        }
        if let Some(limit) = self.ai.max_file_size {
            if file.size_bytes > limit {
                warn!("{:?} is larger than {} bytes, using rules", file.path, limit);
                warnings.push(format!(
                    "{}: too large for analysis ({} bytes), using rules",
                    file.path.display(),
                    file.size_bytes
                ));
                return None;
            }
        }
        Some(suggester)
    }

    async fn decide(&self, file: &FileEntry) -> Decision {
        let stem = file.stem();
        let suffix = original_suffix(&file.path);
        let date = file.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string();
        let vars = TemplateVars {
            original_name: &stem,
            ext: &suffix,
            date_created: &date,
            keywords: None,
        };

        let (rule_name, rule_source) = self.rule_name(file, &vars);
        let mut decision = Decision {
            from: file.path.clone(),
            name: rule_name,
            name_source: rule_source,
            category: self.rules.category_for(&file.extension).to_string(),
            warnings: Vec::new(),
        };

        let Some(suggester) = self.suggester_for(file, &mut decision.warnings) else {
            return decision;
        };

        let content = match self.extractors.extract_file(&file.path).await {
            Ok(content) => content.text,
            Err(e) => {
                warn!("Extraction failed for {:?}: {}", file.path, e);
                decision
                    .warnings
                    .push(format!("{}: extraction failed, using rules ({e})", file.path.display()));
                return decision;
            }
        };

        let content = match &self.key_chunks {
            Some(selector) => match selector.select(&content).await {
                Ok(selected) => selected,
                Err(e) => {
                    warn!("Key chunk selection failed for {:?}: {}", file.path, e);
                    content
                }
            },
            None => content,
        };

        let file_name = file.file_name();
        let mut ai_name = None;

        if self.ai.filename {
            match suggester.suggest_filename(&file_name, &content).await {
                Ok(suggested) => match sanitize_filename(&suggested) {
                    Some(new_stem) => {
                        ai_name = Some((format!("{new_stem}{suffix}"), NameSource::AiFilename));
                    }
                    None => decision.warnings.push(format!(
                        "{}: unusable file name suggestion {suggested:?}",
                        file.path.display()
                    )),
                },
                Err(e) => decision.warnings.push(format!(
                    "{}: file name suggestion failed ({e})",
                    file.path.display()
                )),
            }
        }

        if ai_name.is_none() && self.ai.keywords {
            if let Some(rule) = self.rules.ai_rename_for(&file.extension) {
                match suggester.suggest_keywords(&content).await {
                    Ok(raw) => match sanitize_keywords(&raw) {
                        Some(keywords) => {
                            let vars = TemplateVars {
                                keywords: Some(&keywords),
                                ..vars.clone()
                            };
                            ai_name = if already_applied(&rule.pattern, &vars, &file_name) {
                                debug!("{:?} already carries its keywords", file.path);
                                Some((file_name.clone(), NameSource::Unchanged))
                            } else {
                                Some((render(&rule.pattern, &vars), NameSource::AiKeywords))
                            };
                        }
                        None => decision.warnings.push(format!(
                            "{}: unusable keywords {raw:?}",
                            file.path.display()
                        )),
                    },
                    Err(e) => decision.warnings.push(format!(
                        "{}: keyword suggestion failed ({e})",
                        file.path.display()
                    )),
                }
            }
        }

        if let Some((name, source)) = ai_name {
            decision.name = name;
            decision.name_source = source;
        }

        if self.ai.folder {
            let categories = self.rules.category_names();
            match suggester.classify_folder(&file_name, &content, &categories).await {
                Ok(label) => {
                    if let Some(label) = sanitize_label(&label) {
                        decision.category = label;
                    } else {
                        debug!("No folder opinion for {:?}", file.path);
                    }
                }
                Err(e) => decision.warnings.push(format!(
                    "{}: folder classification failed ({e})",
                    file.path.display()
                )),
            }
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fairy_core::SuggestError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    fn rules(text: &str) -> Arc<RuleTable> {
        Arc::new(RuleTable::from_toml(text).unwrap())
    }

    const DOCS_RULES: &str = r#"
[move]
fallback = "Other"

[[move.categories]]
name = "Docs"
extensions = [".txt"]
"#;

    fn planner(rules: Arc<RuleTable>) -> Planner {
        Planner::new(rules, Arc::new(ExtractorRegistry::with_defaults()))
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn moves(plan: &Plan) -> Vec<(String, String)> {
        plan.entries
            .iter()
            .map(|e| {
                (
                    relative(&plan.root, &e.from).to_string_lossy().replace('\\', "/"),
                    relative(&plan.root, &e.to).to_string_lossy().replace('\\', "/"),
                )
            })
            .collect()
    }

    fn pair(from: &str, to: &str) -> (String, String) {
        (from.to_string(), to.to_string())
    }

    /// Answers by file name, keyword and folder tables; counts calls.
    #[derive(Default)]
    struct FakeSuggester {
        filenames: HashMap<String, std::result::Result<String, String>>,
        keywords: Option<std::result::Result<String, String>>,
        folder: Option<String>,
        calls: AtomicUsize,
        delay_for: Option<String>,
        /// Content passed to `suggest_keywords`
        seen: Mutex<Vec<String>>,
    }

    fn err(msg: &str) -> SuggestError {
        SuggestError::NoResult(msg.to_string())
    }

    #[async_trait]
    impl Suggester for FakeSuggester {
        fn name(&self) -> &str {
            "fake"
        }

        async fn suggest_keywords(&self, content: &str) -> std::result::Result<String, SuggestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(content.to_string());
            match &self.keywords {
                Some(Ok(k)) => Ok(k.clone()),
                Some(Err(e)) => Err(err(e)),
                None => Err(err("no keywords")),
            }
        }

        async fn suggest_filename(
            &self,
            original_name: &str,
            _content: &str,
        ) -> std::result::Result<String, SuggestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_for.as_deref() == Some(original_name) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            match self.filenames.get(original_name) {
                Some(Ok(name)) => Ok(name.clone()),
                Some(Err(e)) => Err(err(e)),
                None => Err(err("no name")),
            }
        }

        async fn classify_folder(
            &self,
            _file_name: &str,
            _content: &str,
            _categories: &[String],
        ) -> std::result::Result<String, SuggestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.folder.clone().ok_or_else(|| err("no folder"))
        }
    }

    fn ai(keywords: bool, filename: bool, folder: bool) -> AiOptions {
        AiOptions {
            keywords,
            filename,
            folder,
            concurrency: 4,
            max_file_size: None,
        }
    }

    // ==================== rule-based ====================

    #[tokio::test]
    async fn test_category_and_fallback() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "alpha");
        write(dir.path(), "b.png", "png");

        let plan = planner(rules(DOCS_RULES)).plan(dir.path(), false).await.unwrap();

        assert_eq!(
            moves(&plan),
            vec![pair("a.txt", "Docs/a.txt"), pair("b.png", "Other/b.png")]
        );
        assert_eq!(plan.preview_lines()[0], "'a.txt' -> 'Docs/a.txt'");
        assert!(plan.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_entries_omitted() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Docs/a.txt", "alpha");
        write(dir.path(), "b.txt", "beta");

        let plan = planner(rules(DOCS_RULES)).plan(dir.path(), true).await.unwrap();
        assert_eq!(moves(&plan), vec![pair("b.txt", "Docs/b.txt")]);
    }

    #[tokio::test]
    async fn test_first_rename_rule_applies() {
        let dir = tempdir().unwrap();
        write(dir.path(), "n.txt", "x");
        let table = format!(
            "{DOCS_RULES}\n[[rename]]\nextensions = [\".txt\"]\npattern = \"A_{{{{original_name}}}}{{{{ext}}}}\"\n\
             [[rename]]\nextensions = [\".txt\"]\npattern = \"B_{{{{original_name}}}}{{{{ext}}}}\"\n"
        );

        let plan = planner(rules(&table)).plan(dir.path(), false).await.unwrap();

        assert_eq!(moves(&plan), vec![pair("n.txt", "Docs/A_n.txt")]);
        assert_eq!(plan.entries[0].name_source, NameSource::Rule);
    }

    #[tokio::test]
    async fn test_date_template_and_replanning_is_empty() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "x");
        write(dir.path(), "photo.png", "x");
        let planner = planner(Arc::new(RuleTable::default()));

        let plan = planner.plan(dir.path(), true).await.unwrap();
        let created = std::fs::metadata(&path)
            .unwrap()
            .created()
            .or_else(|_| std::fs::metadata(&path).unwrap().modified())
            .unwrap();
        let date = chrono::DateTime::<Local>::from(created).format("%Y-%m-%d").to_string();
        assert_eq!(
            moves(&plan),
            vec![
                pair("notes.txt", &format!("Documents/{date}_notes.txt")),
                pair("photo.png", &format!("Images/IMG_{date}_photo.png")),
            ]
        );

        crate::executor::PlanExecutor::new(Arc::new(crate::executor::AutoConfirm))
            .execute(&plan, false, false)
            .await
            .unwrap();

        let second = planner.plan(dir.path(), true).await.unwrap();
        assert!(second.is_empty(), "{:?}", moves(&second));
    }

    #[tokio::test]
    async fn test_excluded_names_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "keep.txt", "x");
        write(dir.path(), "node_modules/dep.txt", "x");
        write(dir.path(), "rules.toml", "x");

        let plan = planner(rules(DOCS_RULES)).plan(dir.path(), true).await.unwrap();
        assert_eq!(moves(&plan), vec![pair("keep.txt", "Docs/keep.txt")]);
    }

    #[tokio::test]
    async fn test_collision_with_existing_file_gets_suffix() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Docs/a.txt", "already here");
        write(dir.path(), "a.txt", "new");

        let plan = planner(rules(DOCS_RULES)).plan(dir.path(), false).await.unwrap();
        assert_eq!(moves(&plan), vec![pair("a.txt", "Docs/a_1.txt")]);
    }

    // ==================== AI ====================

    #[tokio::test]
    async fn test_identical_ai_names_get_distinct_destinations() {
        let dir = tempdir().unwrap();
        write(dir.path(), "one.txt", "invoice one");
        write(dir.path(), "two.txt", "invoice two");
        write(dir.path(), "three.txt", "invoice three");

        let mut fake = FakeSuggester::default();
        for name in ["one.txt", "two.txt", "three.txt"] {
            fake.filenames.insert(name.to_string(), Ok("invoice march".to_string()));
        }

        let plan = planner(rules(DOCS_RULES))
            .with_suggester(Arc::new(fake), ai(false, true, false))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(
            moves(&plan),
            vec![
                pair("one.txt", "Docs/invoice_march.txt"),
                pair("three.txt", "Docs/invoice_march_1.txt"),
                pair("two.txt", "Docs/invoice_march_2.txt"),
            ]
        );
        assert!(plan.entries.iter().all(|e| e.name_source == NameSource::AiFilename));
    }

    #[tokio::test]
    async fn test_order_kept_with_slow_suggestions() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "b.txt", "b");

        let mut fake = FakeSuggester {
            delay_for: Some("a.txt".to_string()),
            ..Default::default()
        };
        fake.filenames.insert("a.txt".to_string(), Ok("same".to_string()));
        fake.filenames.insert("b.txt".to_string(), Ok("same".to_string()));

        let plan = planner(rules(DOCS_RULES))
            .with_suggester(Arc::new(fake), ai(false, true, false))
            .plan(dir.path(), false)
            .await
            .unwrap();

        // a.txt is first in scan order even though its answer came last
        assert_eq!(
            moves(&plan),
            vec![pair("a.txt", "Docs/same.txt"), pair("b.txt", "Docs/same_1.txt")]
        );
    }

    #[tokio::test]
    async fn test_keywords_template() {
        let dir = tempdir().unwrap();
        write(dir.path(), "memo.txt", "trip budget");
        let table = format!(
            "{DOCS_RULES}\n[rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = FakeSuggester {
            keywords: Some(Ok("travel budget, may".to_string())),
            ..Default::default()
        };

        let plan = planner(rules(&table))
            .with_suggester(Arc::new(fake), ai(true, false, false))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("memo.txt", "Docs/memo_travel_budget_may.txt")]);
        assert_eq!(plan.entries[0].name_source, NameSource::AiKeywords);
    }

    #[tokio::test]
    async fn test_keywords_not_reapplied_on_replan() {
        let dir = tempdir().unwrap();
        write(dir.path(), "memo.txt", "budget planning for may");
        let table = format!(
            "{DOCS_RULES}\n[[rename]]\nextensions = [\".txt\"]\npattern = \"{{{{date_created}}}}_{{{{original_name}}}}{{{{ext}}}}\"\n\
             [rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = Arc::new(FakeSuggester {
            keywords: Some(Ok("budget plan".to_string())),
            ..Default::default()
        });
        let planner = planner(rules(&table)).with_suggester(fake.clone(), ai(true, false, false));

        let plan = planner.plan(dir.path(), true).await.unwrap();
        assert_eq!(moves(&plan), vec![pair("memo.txt", "Docs/memo_budget_plan.txt")]);

        crate::executor::PlanExecutor::new(Arc::new(crate::executor::AutoConfirm))
            .execute(&plan, false, false)
            .await
            .unwrap();

        let second = planner.plan(dir.path(), true).await.unwrap();
        assert!(second.is_empty(), "{:?}", moves(&second));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_extraction_failure_falls_back_with_warning() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0x63, 0xE9, 0xFF]).unwrap();
        let table = format!(
            "{DOCS_RULES}\n[rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = Arc::new(FakeSuggester {
            keywords: Some(Ok("never used".to_string())),
            ..Default::default()
        });

        let plan = planner(rules(&table))
            .with_suggester(fake.clone(), ai(true, false, false))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("bad.txt", "Docs/bad.txt")]);
        assert_eq!(plan.entries[0].name_source, NameSource::Unchanged);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("extraction failed"), "{}", plan.warnings[0]);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_skips_ai() {
        let dir = tempdir().unwrap();
        write(dir.path(), "small.txt", "tiny");
        write(dir.path(), "big.txt", &"x".repeat(100));
        let table = format!(
            "{DOCS_RULES}\n[rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = Arc::new(FakeSuggester {
            keywords: Some(Ok("short".to_string())),
            ..Default::default()
        });
        let options = AiOptions {
            max_file_size: Some(50),
            ..ai(true, false, false)
        };

        let plan = planner(rules(&table))
            .with_suggester(fake.clone(), options)
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(
            moves(&plan),
            vec![pair("big.txt", "Docs/big.txt"), pair("small.txt", "Docs/small_short.txt")]
        );
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("too large"));
    }

    #[tokio::test]
    async fn test_key_chunks_replace_long_content() {
        use fairy_embed::{EmbedderPool, HashEmbedder};

        let dir = tempdir().unwrap();
        let long = [
            "budget figures for the year ",
            "travel plans to lisbon city ",
            "garden planting and seeding ",
            "recipe for lemon cake today ",
            "invoice number twelve paid ",
            "meeting notes from monday a ",
        ]
        .concat();
        write(dir.path(), "long.txt", &long);
        write(dir.path(), "short.txt", "brief");
        let table = format!(
            "{DOCS_RULES}\n[rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = Arc::new(FakeSuggester {
            keywords: Some(Ok("kw".to_string())),
            ..Default::default()
        });
        let pool = Arc::new(EmbedderPool::new(Arc::new(HashEmbedder::new(64)), 2));
        let selector = KeyChunkSelector::new(
            pool,
            fairy_core::ChunkConfig {
                size: 28,
                overlap: 0,
            },
        )
        .with_clusters(2);

        planner(rules(&table))
            .with_suggester(fake.clone(), ai(true, false, false))
            .with_key_chunks(selector)
            .plan(dir.path(), false)
            .await
            .unwrap();

        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        // scan order: long.txt, short.txt
        assert!(seen[0].len() < long.len());
        assert!(seen[0].split("\n\n").count() <= 2);
        assert!(seen[0].split("\n\n").all(|part| long.contains(part)));
        assert_eq!(seen[1], "brief");
    }

    #[tokio::test]
    async fn test_suggestion_failure_falls_back_with_warning() {
        let dir = tempdir().unwrap();
        write(dir.path(), "memo.txt", "content");
        let table = format!(
            "{DOCS_RULES}\n[rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = FakeSuggester {
            keywords: Some(Err("keyword extraction failed".to_string())),
            ..Default::default()
        };

        let plan = planner(rules(&table))
            .with_suggester(Arc::new(fake), ai(true, false, false))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("memo.txt", "Docs/memo.txt")]);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("keyword"));
    }

    #[tokio::test]
    async fn test_keywords_only_for_listed_extensions() {
        let dir = tempdir().unwrap();
        write(dir.path(), "data.csv", "a,b");
        let table = format!(
            "{DOCS_RULES}\n[rename_ai]\nextensions = [\".txt\"]\n"
        );
        let fake = Arc::new(FakeSuggester {
            keywords: Some(Ok("never".to_string())),
            ..Default::default()
        });

        let plan = planner(rules(&table))
            .with_suggester(fake.clone(), ai(true, false, false))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("data.csv", "Other/data.csv")]);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_folder_classification_overrides_category() {
        let dir = tempdir().unwrap();
        write(dir.path(), "inv.txt", "Invoice #12");
        let fake = FakeSuggester {
            folder: Some("Invoices".to_string()),
            ..Default::default()
        };

        let plan = planner(rules(DOCS_RULES))
            .with_suggester(Arc::new(fake), ai(false, false, true))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("inv.txt", "Invoices/inv.txt")]);
    }

    #[tokio::test]
    async fn test_no_opinion_folder_keeps_category() {
        let dir = tempdir().unwrap();
        write(dir.path(), "inv.txt", "Invoice #12");
        let fake = FakeSuggester {
            folder: Some("기타".to_string()),
            ..Default::default()
        };

        let plan = planner(rules(DOCS_RULES))
            .with_suggester(Arc::new(fake), ai(false, false, true))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("inv.txt", "Docs/inv.txt")]);
        assert!(plan.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_files_skip_ai() {
        let dir = tempdir().unwrap();
        write(dir.path(), "pic.png", "not really a png");
        let fake = Arc::new(FakeSuggester {
            folder: Some("Pictures".to_string()),
            ..Default::default()
        });

        let plan = planner(rules(DOCS_RULES))
            .with_suggester(fake.clone(), ai(true, true, true))
            .plan(dir.path(), false)
            .await
            .unwrap();

        assert_eq!(moves(&plan), vec![pair("pic.png", "Other/pic.png")]);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let result = planner(rules(DOCS_RULES))
            .plan(Path::new("/no/such/root"), true)
            .await;
        assert!(result.is_err());
    }
}
