//! File name templates and sanitizers.

use std::path::Path;

pub const ORIGINAL_NAME: &str = "{{original_name}}";
pub const EXT: &str = "{{ext}}";
pub const DATE_CREATED: &str = "{{date_created}}";
pub const KEYWORDS: &str = "{{keywords}}";

/// Folder labels meaning "no opinion".
const NO_OPINION: &[&str] = &["기타", "other", "others"];

/// Values substituted into a rename template.
#[derive(Debug, Clone)]
pub struct TemplateVars<'a> {
    /// File name without extension
    pub original_name: &'a str,
    /// Original suffix including the dot, empty when none
    pub ext: &'a str,
    /// `YYYY-MM-DD`
    pub date_created: &'a str,
    pub keywords: Option<&'a str>,
}

/// Literal placeholder substitution.
pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    let rendered = template
        .replace(ORIGINAL_NAME, vars.original_name)
        .replace(DATE_CREATED, vars.date_created)
        .replace(EXT, vars.ext);
    match vars.keywords {
        Some(keywords) => rendered.replace(KEYWORDS, keywords),
        None => rendered,
    }
}

/// Whether `file_name` already has the shape `template` produces, i.e. the
/// text rendered around `{{original_name}}` already surrounds its stem.
pub fn already_applied(template: &str, vars: &TemplateVars<'_>, file_name: &str) -> bool {
    let Some((before, after)) = template.split_once(ORIGINAL_NAME) else {
        return false;
    };
    let prefix = render(before, vars);
    let suffix = render(after, vars);
    if prefix.is_empty() && suffix == vars.ext {
        // template only keeps the name
        return false;
    }
    file_name.len() > prefix.len() + suffix.len()
        && file_name.starts_with(&prefix)
        && file_name.ends_with(&suffix)
}

/// Original suffix of `path` including the dot, case preserved.
pub fn original_suffix(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn keep(value: &str, allow_dot: bool) -> String {
    value
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_alphanumeric() || c == '_' || c == '-' => Some(c),
            '.' if allow_dot => Some('.'),
            _ => None,
        })
        .collect()
}

/// AI-suggested file stem reduced to alphanumerics, `_`, `-` and `.`.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let cleaned = keep(name, true);
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// AI keywords reduced to alphanumerics, `_` and `-`.
pub fn sanitize_keywords(keywords: &str) -> Option<String> {
    let cleaned = keep(keywords, false);
    let parts: Vec<&str> = cleaned.split('_').filter(|p| !p.is_empty()).collect();
    (!parts.is_empty()).then(|| parts.join("_"))
}

/// Whether `label` names a single directory entry.
pub fn is_safe_component(label: &str) -> bool {
    !label.trim().is_empty()
        && label != "."
        && label != ".."
        && !label.contains(['/', '\\', '\0'])
        && !label.contains(std::path::MAIN_SEPARATOR)
}

pub fn is_no_opinion(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || NO_OPINION.iter().any(|n| label.eq_ignore_ascii_case(n))
}

/// AI folder label as a safe path component, or `None` when the model had
/// no opinion or nothing usable is left.
pub fn sanitize_label(label: &str) -> Option<String> {
    if is_no_opinion(label) {
        return None;
    }
    let cleaned: String = label
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'))
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim().to_string();
    (is_safe_component(&cleaned) && !is_no_opinion(&cleaned)).then_some(cleaned)
}

/// `name` with `_n` inserted before its extension.
pub fn with_suffix(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{n}.{ext}"),
        _ => format!("{name}_{n}"),
    }
}
