//! Embedder pool for concurrent embedding operations.

use fairy_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Pool around an embedder with concurrency control.
///
/// Batches are split by [`EmbeddingConfig::batch_size`]; every sub-batch
/// holds one semaphore permit while the backend runs. Outputs are checked for
/// count and dimension before they are handed back, so callers can rely on
/// one vector per input.
pub struct EmbedderPool {
    embedder: Arc<dyn Embedder>,
    /// Semaphore to limit concurrent inference
    semaphore: Semaphore,
    max_concurrent: usize,
}

impl EmbedderPool {
    /// Create a new embedder pool.
    pub fn new(embedder: Arc<dyn Embedder>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            embedder,
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
        }
    }

    /// Get the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Get the model name.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Get the underlying embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    /// Embed a batch of texts. Returns one output per input, in order.
    pub async fn embed_batch(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        let batch_size = config.batch_size.max(1);
        let mut outputs = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| EmbedError::Inference(format!("semaphore error: {e}")))?;

            debug!("Embedding batch of {} texts with {}", batch.len(), self.model_name());
            let embedded = self.embedder.embed_text(batch, config).await?;
            if embedded.len() != batch.len() {
                return Err(EmbedError::Inference(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            for output in &embedded {
                self.check_dimension(output)?;
            }
            outputs.extend(embedded);
        }

        Ok(outputs)
    }

    /// Embed a single query.
    pub async fn embed_query(
        &self,
        query: &str,
        config: &EmbeddingConfig,
    ) -> Result<EmbeddingOutput, EmbedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbedError::Inference(format!("semaphore error: {e}")))?;

        let output = self.embedder.embed_query(query, config).await?;
        self.check_dimension(&output)?;
        Ok(output)
    }

    fn check_dimension(&self, output: &EmbeddingOutput) -> Result<(), EmbedError> {
        let expected = self.dimension();
        if output.embedding.len() != expected {
            return Err(EmbedError::DimensionMismatch {
                expected,
                actual: output.embedding.len(),
            });
        }
        Ok(())
    }

    /// Permits currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get max concurrent operations.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
