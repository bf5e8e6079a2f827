//! No-op embedder.
//!
//! [`NoopEmbedder`] returns zero vectors. Vector similarity against a zero
//! vector is always 0, so an index built with it is only searchable through
//! lexical matching.

use async_trait::async_trait;
use fairy_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};

/// Default dimension, matching the default Ollama embedding model.
pub const DEFAULT_DIMENSION: usize = 1024;

/// No-op embedder that returns zero-vectors.
///
/// # Example
///
/// ```rust
/// use fairy_embed::NoopEmbedder;
/// use fairy_core::{Embedder, EmbeddingConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = NoopEmbedder::new();
/// let outputs = embedder
///     .embed_text(&["Hello", "World"], &EmbeddingConfig::default())
///     .await?;
///
/// assert_eq!(outputs.len(), 2);
/// assert!(outputs[0].embedding.iter().all(|&v| v == 0.0));
/// # Ok(())
/// # }
/// ```
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    /// Create a new no-op embedder with the default dimension.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Create a new no-op embedder with custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    fn model_name(&self) -> &str {
        "noop"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        _config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        Ok(texts
            .iter()
            .map(|text| EmbeddingOutput {
                embedding: vec![0.0; self.dimension],
                token_count: text.split_whitespace().count(),
            })
            .collect())
    }
}
