//! Deterministic feature-hashing embedder.
//!
//! Each lower-cased word token is hashed with blake3; the first four bytes
//! pick a bucket and the fifth byte a sign. Texts sharing vocabulary end up
//! with a high cosine similarity, which is enough for offline use and for
//! reproducible tests without a model server.

use async_trait::async_trait;
use fairy_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};

/// Feature-hashing embedder. Same input, same vector, on every platform.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hashing embedder producing `dimension`-sized vectors.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str, normalize: bool) -> EmbeddingOutput {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut token_count = 0;

        for token in tokens(text) {
            token_count += 1;
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket =
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize % self.dimension;
            let sign = if bytes[4] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        if normalize {
            let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        EmbeddingOutput {
            embedding,
            token_count,
        }
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "blake3-hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        Ok(texts
            .iter()
            .map(|text| self.embed_one(text, config.normalize))
            .collect())
    }
}
