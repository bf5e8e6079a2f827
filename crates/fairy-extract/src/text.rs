//! Text content extractor.

use async_trait::async_trait;
use fairy_core::{ContentExtractor, ExtractError, ExtractedContent};
use std::path::Path;
use tokio::fs;

/// Extensions read as UTF-8 text, lower case without the dot.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "rst", "log", "csv", "tsv", "json", "xml", "html", "htm",
    "css", "yaml", "yml", "toml", "ini", "cfg", "conf", "tex", "rs", "py", "js", "ts", "tsx",
    "jsx", "go", "java", "kt", "c", "h", "cpp", "hpp", "cs", "rb", "php", "swift", "sh", "bash",
    "zsh", "sql", "lua",
];

/// Extractor for UTF-8 text files.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn supported_types(&self) -> &[&str] {
        &[
            "text/plain",
            "text/markdown",
            "text/x-markdown",
            "text/csv",
            "text/tab-separated-values",
            "text/html",
            "text/css",
            "text/xml",
            "application/xml",
            "application/json",
            "application/toml",
            "application/yaml",
            "text/x-yaml",
        ]
    }

    fn can_extract_by_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractError> {
        let bytes = fs::read(path).await?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);

        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::Parse(format!("{}: not valid UTF-8 ({e})", path.display())))?
            .to_string();

        Ok(ExtractedContent {
            text,
            mime_type: mime_guess::from_path(path)
                .first_or_text_plain()
                .to_string(),
        })
    }
}
