//! Hybrid search for File Fairy.
//!
//! [`HybridSearcher`] embeds a natural-language query, asks the store for
//! vector neighbours plus lexical matches, turns every candidate into a
//! similarity in `[0, 1]` and returns the ranked, threshold-filtered
//! [`SearchResponse`](fairy_core::SearchResponse).

pub mod searcher;

pub use searcher::{HybridSearcher, EXCERPT_CHARS};
