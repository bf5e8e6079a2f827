//! # fairy-core
//!
//! Core types and traits shared by the File Fairy crates.
//!
//! File Fairy has two pipelines built on the same foundation:
//!
//! - **Organize**: scan a directory, decide a new name and category folder for
//!   every file (from a rule table, optionally refined by AI suggestions) and
//!   apply the resulting move plan.
//! - **Search**: extract text from files, chunk it, embed each chunk and
//!   answer natural-language queries with a hybrid vector + lexical ranking.
//!
//! ## Architecture
//!
//! ```text
//! scan → RuleTable | Suggester → Plan → preview → PlanExecutor → log
//!
//! File → ContentExtractor → Chunker → Embedder → VectorStore
//!                                                    ↓
//!                          query → Embedder → hybrid search → SearchResponse
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FileEntry`] | A file observed during a scan |
//! | [`ChangeEntry`] | One planned move/rename |
//! | [`IndexRecord`] | A stored, embedded chunk of a file |
//! | [`Candidate`] | A record returned by a store together with its match signal |
//! | [`SearchResult`] | A ranked file match with excerpt |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ContentExtractor`] | Extract text from files |
//! | [`Chunker`] | Split extracted text into windows |
//! | [`Embedder`] | Generate vector embeddings |
//! | [`VectorStore`] | Store and search index records |
//! | [`Suggester`] | AI keyword, filename and folder suggestions |
//!
//! ## Related Crates
//!
//! - `fairy-organize`: rule table, planner and plan executor
//! - `fairy-chunker`: fixed-size overlapping chunker
//! - `fairy-embed`: embedder pool and offline embedders
//! - `fairy-llm`: Ollama-backed suggester and embedder
//! - `fairy-extract`: content extraction registry
//! - `fairy-store`: in-memory and SQLite vector stores
//! - `fairy-index`: index service (upsert/remove/stats/clear)
//! - `fairy-query`: hybrid search

pub mod error;
pub mod relevance;
pub mod traits;
pub mod types;

pub use error::{
    ChunkError, EmbedError, Error, ExtractError, Result, RuleError, StoreError, SuggestError,
};
pub use traits::*;
pub use types::*;
