//! Organizer suggestions from an Ollama generation model.

use async_trait::async_trait;
use fairy_core::{SuggestError, Suggester};
use std::sync::Arc;
use tracing::debug;

use crate::client::{OllamaClient, OllamaError};

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = "gemma3:4b";

/// Content sent to the model is cut to this many characters.
pub const MAX_CONTENT_CHARS: usize = 3500;

/// Legacy "keyword extraction failed" answer.
const KEYWORD_FAILURE: &str = "키워드추출실패";

/// Keyword answers that carry no information.
const MEANINGLESS: &[&str] = &[
    "none", "n/a", "unknown", "empty", "없음", "비어있음", "알수없음", "모름", "정보없음",
    "내용없음", "빈내용",
];

/// Characters never allowed in a parsed answer.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']'];

impl From<OllamaError> for SuggestError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Request(e) | OllamaError::Client(e) => SuggestError::Unavailable(e),
            other => SuggestError::Request(other.to_string()),
        }
    }
}

/// [`Suggester`] backed by an Ollama model.
pub struct LlmSuggester {
    client: Arc<OllamaClient>,
    model: String,
}

impl LlmSuggester {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Model used for generation.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn ask(&self, prompt: String) -> Result<String, SuggestError> {
        let response = self.client.generate(&self.model, &prompt).await?;
        Ok(strip_reasoning(&response))
    }
}

/// Cut `content` to [`MAX_CONTENT_CHARS`] characters.
fn truncate_content(content: &str) -> &str {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Drop a leading `<think>...</think>` block emitted by reasoning models.
fn strip_reasoning(response: &str) -> String {
    match (response.find("<think>"), response.find("</think>")) {
        (Some(start), Some(end)) if start < end => {
            let mut out = String::with_capacity(response.len());
            out.push_str(&response[..start]);
            out.push_str(&response[end + "</think>".len()..]);
            out.trim().to_string()
        }
        _ => response.trim().to_string(),
    }
}

fn clean(value: &str) -> String {
    value
        .chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .collect::<String>()
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '`' || c == '.')
        .trim()
        .to_string()
}

/// Value of the first `label: value` line whose label mentions one of
/// `labels`, with brackets and path-hostile characters removed.
fn parse_labeled(response: &str, labels: &[&str]) -> Option<String> {
    response.lines().find_map(|line| {
        let (label, value) = line.split_once(':')?;
        let label = label.to_lowercase();
        if !labels.iter().any(|l| label.contains(l)) {
            return None;
        }
        let value = clean(value);
        (!value.is_empty()).then_some(value)
    })
}

/// The answer itself when the model replied with a single bare line.
fn single_line(response: &str) -> Option<String> {
    let mut lines = response.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next()?;
    if lines.next().is_some() {
        return None;
    }
    let value = clean(first);
    (!value.is_empty()).then_some(value)
}

fn reject_sentinel(value: String) -> Result<String, SuggestError> {
    if value.contains(KEYWORD_FAILURE) {
        return Err(SuggestError::NoResult(format!(
            "model reported failure: {value}"
        )));
    }
    Ok(value)
}

fn parse_keywords(response: &str) -> Result<String, SuggestError> {
    let raw = parse_labeled(response, &["keyword", "키워드"])
        .or_else(|| single_line(response))
        .ok_or_else(|| SuggestError::NoResult("no keywords in response".to_string()))?;
    let raw = reject_sentinel(raw)?;

    let parts: Vec<&str> = raw
        .split(|c: char| c == '_' || c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| !MEANINGLESS.contains(&p.to_lowercase().as_str()))
        .collect();

    if parts.is_empty() {
        return Err(SuggestError::NoResult(format!(
            "only meaningless keywords: {raw}"
        )));
    }
    Ok(parts.join("_"))
}

fn parse_filename(response: &str) -> Result<String, SuggestError> {
    let raw = parse_labeled(response, &["filename", "file name", "파일명", "키워드"])
        .or_else(|| single_line(response))
        .ok_or_else(|| SuggestError::NoResult("no file name in response".to_string()))?;
    let raw = reject_sentinel(raw)?;

    // the extension is kept by the caller
    let stem = match raw.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            stem.to_string()
        }
        _ => raw,
    };
    let stem = stem.trim().to_string();
    if stem.is_empty() {
        return Err(SuggestError::NoResult("empty file name".to_string()));
    }
    Ok(stem)
}

fn parse_folder(response: &str) -> Result<String, SuggestError> {
    parse_labeled(response, &["folder", "category", "폴더"])
        .or_else(|| single_line(response))
        .ok_or_else(|| SuggestError::NoResult("no folder in response".to_string()))
        .and_then(reject_sentinel)
}

fn require_content(content: &str) -> Result<&str, SuggestError> {
    if content.trim().is_empty() {
        return Err(SuggestError::NoResult("no content to analyze".to_string()));
    }
    Ok(truncate_content(content))
}

#[async_trait]
impl Suggester for LlmSuggester {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn suggest_keywords(&self, content: &str) -> Result<String, SuggestError> {
        let content = require_content(content)?;
        let prompt = format!(
            "Read the file content below and extract exactly 3 short keywords that summarize it.\n\
             Use the language of the content. Join the keywords with underscores.\n\n\
             Content:\n---\n{content}\n---\n\n\
             Answer with one line only, in this format:\n\
             Keywords: [keyword1_keyword2_keyword3]"
        );
        let response = self.ask(prompt).await?;
        debug!("Keyword response: {response:?}");
        parse_keywords(&response)
    }

    async fn suggest_filename(
        &self,
        original_name: &str,
        content: &str,
    ) -> Result<String, SuggestError> {
        let content = require_content(content)?;
        let prompt = format!(
            "You name files. Suggest a descriptive file name for the content below.\n\
             Original file name: {original_name}\n\n\
             Content:\n---\n{content}\n---\n\n\
             Rules:\n\
             - 3 to 8 words joined by underscores\n\
             - no extension, no path\n\
             - keep the original name if it is already descriptive\n\n\
             Answer with one line only, in this format:\n\
             Filename: [new_file_name]"
        );
        let response = self.ask(prompt).await?;
        debug!("Filename response: {response:?}");
        parse_filename(&response)
    }

    async fn classify_folder(
        &self,
        file_name: &str,
        content: &str,
        categories: &[String],
    ) -> Result<String, SuggestError> {
        let content = require_content(content)?;
        let prompt = format!(
            "Choose the folder this file belongs in.\n\
             File name: {file_name}\n\
             Known folders: {}\n\n\
             Content:\n---\n{content}\n---\n\n\
             Prefer one of the known folders. Answer with one line only, in this format:\n\
             Folder: [folder_name]",
            categories.join(", ")
        );
        let response = self.ask(prompt).await?;
        debug!("Folder response: {response:?}");
        parse_folder(&response)
    }
}
