//! # fairy-embed
//!
//! Embedding support for the File Fairy index.
//!
//! The production embedder talks to an Ollama server and lives in
//! `fairy-llm`. This crate holds everything that works offline, plus the
//! pool every embedding call goes through.
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EmbedderPool`] | Semaphore-bounded access to an embedder, with batching and output validation |
//! | [`HashEmbedder`] | Deterministic feature-hashing embedder (blake3), no model required |
//! | [`NoopEmbedder`] | Zero vectors, for tests and for indexing without search |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fairy_embed::{EmbedderPool, HashEmbedder};
//! use fairy_core::EmbeddingConfig;
//! use std::sync::Arc;
//!
//! let pool = EmbedderPool::new(Arc::new(HashEmbedder::new(1024)), 4);
//! let embeddings = pool
//!     .embed_batch(&["Hello world", "Quarterly report"], &EmbeddingConfig::default())
//!     .await?;
//! assert_eq!(embeddings[0].embedding.len(), 1024);
//! ```

pub mod hash;
pub mod noop;
pub mod pool;

pub use hash::HashEmbedder;
pub use noop::NoopEmbedder;
pub use pool::EmbedderPool;
