//! Core traits for File Fairy components.
//!
//! - [`ContentExtractor`]: Extract text from files
//! - [`Chunker`]: Split text into windows
//! - [`Embedder`]: Generate vector embeddings
//! - [`VectorStore`]: Store and search index records
//! - [`Suggester`]: AI keyword, filename and folder suggestions
//!
//! Implementations are swapped in by the CLI (e.g. Ollama vs. the offline
//! hashing embedder) without touching the rest of the system.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{ChunkError, EmbedError, ExtractError, StoreError, SuggestError};
use crate::types::{
    Candidate, ChunkConfig, ChunkOutput, EmbeddingConfig, EmbeddingOutput, ExtractedContent,
    IndexRecord, SearchQuery, StoreStats,
};

// ============================================================================
// Content Extraction
// ============================================================================

/// Trait for extracting text from files.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Returns the MIME types this extractor can handle.
    fn supported_types(&self) -> &[&str];

    /// Check if this extractor can handle the given file.
    fn can_extract(&self, path: &Path, mime_type: &str) -> bool {
        self.supported_types().contains(&mime_type) || self.can_extract_by_extension(path)
    }

    /// Check if extractor can handle based on file extension.
    fn can_extract_by_extension(&self, _path: &Path) -> bool {
        false
    }

    /// Extract content from a file.
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractError>;
}

// ============================================================================
// Chunking
// ============================================================================

/// Trait for splitting text into chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Name of this chunking strategy.
    fn name(&self) -> &str;

    /// Chunk the text.
    async fn chunk(
        &self,
        text: &str,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed text content. Returns one output per input, in order.
    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError>;

    /// Embed a query.
    async fn embed_query(
        &self,
        query: &str,
        config: &EmbeddingConfig,
    ) -> Result<EmbeddingOutput, EmbedError> {
        let results = self.embed_text(&[query], config).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Trait for index record storage and search.
///
/// Readers never observe a half-applied [`VectorStore::replace_file`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the store.
    async fn init(&self) -> Result<(), StoreError>;

    /// Atomically replace every record of `path` with `records`.
    async fn replace_file(&self, path: &Path, records: Vec<IndexRecord>)
        -> Result<(), StoreError>;

    /// Delete all records for a file. Returns the number removed.
    async fn delete_by_file_path(&self, path: &Path) -> Result<u64, StoreError>;

    /// Re-point all records of a file (for moves and renames).
    async fn update_file_path(&self, from: &Path, to: &Path) -> Result<u64, StoreError>;

    /// Whether any record exists for `path`.
    async fn contains_file(&self, path: &Path) -> Result<bool, StoreError>;

    /// All records for a file, ordered by chunk index.
    async fn get_chunks_for_file(&self, path: &Path) -> Result<Vec<IndexRecord>, StoreError>;

    /// Nearest vector neighbours only.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, StoreError>;

    /// Vector neighbours merged with lexical matches on chunk text and file name.
    async fn hybrid_search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, StoreError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Drop every record. The store stays usable.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Flush pending writes.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// AI suggestions used by the organizer.
///
/// Every call returns `Err` when no usable answer exists; implementations
/// must never leak sentinel strings as `Ok` values.
#[async_trait]
pub trait Suggester: Send + Sync {
    /// Name of the backend, for logs.
    fn name(&self) -> &str;

    /// Short keywords describing the content, joined by `_`.
    async fn suggest_keywords(&self, content: &str) -> Result<String, SuggestError>;

    /// A descriptive file name (without extension) for the content.
    async fn suggest_filename(
        &self,
        original_name: &str,
        content: &str,
    ) -> Result<String, SuggestError>;

    /// A folder label for the file, ideally one of `categories`.
    async fn classify_folder(
        &self,
        file_name: &str,
        content: &str,
        categories: &[String],
    ) -> Result<String, SuggestError>;
}
