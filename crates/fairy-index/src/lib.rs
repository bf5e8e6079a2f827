//! Index service for File Fairy.
//!
//! This crate owns the write side of the vector index:
//! extraction → chunking → embedding → storage.
//!
//! # Components
//!
//! - [`IndexService`]: single-writer service over a [`VectorStore`](fairy_core::VectorStore)
//! - [`IndexConfig`]: chunking and embedding settings
//! - [`IndexUpdate`]: events emitted during indexing
//! - [`FolderReport`]: outcome of indexing a whole folder
//!
//! # Example
//!
//! ```rust,ignore
//! use fairy_index::{IndexConfig, IndexService, IndexUpdate};
//!
//! let index = IndexService::new(store, embedder, IndexConfig::default());
//! index.init().await?;
//!
//! // Subscribe to updates
//! let mut updates = index.subscribe();
//!
//! let report = index.index_folder(&folder, true, None).await?;
//! println!("{} indexed, {} failed", report.indexed.len(), report.failed.len());
//!
//! let response = index.search("quarterly budget", 10, 0.7).await;
//! index.shutdown().await?;
//! ```

pub mod indexer;

pub use indexer::{FolderReport, IndexConfig, IndexService, IndexUpdate};
