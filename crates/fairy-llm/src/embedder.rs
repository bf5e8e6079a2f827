//! Embeddings from an Ollama embedding model.

use async_trait::async_trait;
use fairy_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use std::sync::Arc;
use tracing::debug;

use crate::client::{OllamaClient, OllamaError};

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "dengcao/Qwen3-Embedding-0.6B:Q8_0";

/// Output dimension of [`DEFAULT_EMBED_MODEL`].
pub const DEFAULT_EMBED_DIMENSION: usize = 1024;

impl From<OllamaError> for EmbedError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Request(e) | OllamaError::Client(e) => EmbedError::Unavailable(e),
            other => EmbedError::Inference(other.to_string()),
        }
    }
}

/// [`Embedder`] backed by Ollama's `/api/embed`.
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    /// The default model at its native dimension.
    pub fn with_default_model(client: Arc<OllamaClient>) -> Self {
        Self::new(client, DEFAULT_EMBED_MODEL, DEFAULT_EMBED_DIMENSION)
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        let vectors = self.client.embed(&self.model, texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbedError::Inference(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        debug!("Embedded {} texts with {}", texts.len(), self.model);

        vectors
            .into_iter()
            .zip(texts)
            .map(|(mut embedding, text)| {
                if embedding.len() != self.dimension {
                    return Err(EmbedError::DimensionMismatch {
                        expected: self.dimension,
                        actual: embedding.len(),
                    });
                }
                if config.normalize {
                    l2_normalize(&mut embedding);
                }
                Ok(EmbeddingOutput {
                    embedding,
                    token_count: text.split_whitespace().count(),
                })
            })
            .collect()
    }
}
