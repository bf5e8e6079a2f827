//! Query execution and scoring.

use fairy_core::relevance::text_relevance;
use fairy_core::{
    Candidate, EmbeddingConfig, Error, MatchSignal, SearchQuery, SearchResponse, SearchResult,
    VectorStore,
};
use fairy_embed::EmbedderPool;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, error};

/// Characters of chunk text kept in a result excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// Hybrid (vector + lexical) searcher.
pub struct HybridSearcher {
    /// Vector store
    store: Arc<dyn VectorStore>,
    /// Embedder for query embedding
    embedder: Arc<EmbedderPool>,
    /// Whether to merge lexical matches into the vector neighbours
    hybrid: bool,
}

impl HybridSearcher {
    /// Create a searcher that merges vector and lexical candidates.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<EmbedderPool>) -> Self {
        Self {
            store,
            embedder,
            hybrid: true,
        }
    }

    /// Vector neighbours only, no lexical candidates.
    #[must_use]
    pub fn vector_only(mut self) -> Self {
        self.hybrid = false;
        self
    }

    /// Search the index.
    ///
    /// Never fails: a blank query or any internal error produces a response
    /// with `success == false` and no results.
    pub async fn search(&self, query: &str, limit: usize, threshold: f32) -> SearchResponse {
        if query.trim().is_empty() {
            return SearchResponse::failed(query, "query is empty");
        }

        match self.ranked(query, limit, threshold).await {
            Ok(results) => {
                debug!("Query {:?} matched {} results", query, results.len());
                SearchResponse::ok(query, results)
            }
            Err(e) => {
                error!("Search failed for {:?}: {}", query, e);
                SearchResponse::failed(query, e.to_string())
            }
        }
    }

    async fn ranked(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>, Error> {
        let embedding = self
            .embedder
            .embed_query(query, &EmbeddingConfig::default())
            .await?;

        let search_query = SearchQuery {
            embedding: embedding.embedding,
            text: self.hybrid.then(|| query.to_string()),
            limit: limit.saturating_mul(2),
        };

        let candidates = if self.hybrid {
            self.store.hybrid_search(&search_query).await
        } else {
            self.store.search(&search_query).await
        }?;

        debug!("Store returned {} candidates", candidates.len());
        Ok(rank(query, candidates, limit, threshold))
    }
}

/// Similarity of a candidate in `[0, 1]`.
fn similarity(query: &str, candidate: &Candidate) -> f32 {
    match candidate.signal {
        MatchSignal::Distance(distance) => (1.0 - distance).clamp(0.0, 1.0),
        MatchSignal::Score(score) => score.clamp(0.0, 1.0),
        MatchSignal::Lexical => text_relevance(
            query,
            &candidate.record.content,
            &candidate.record.file_name,
        ),
    }
}

fn round3(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Score, filter, sort and truncate candidates.
fn rank(query: &str, candidates: Vec<Candidate>, limit: usize, threshold: f32) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let score = similarity(query, &candidate);
            if score < threshold {
                return None;
            }
            let record = candidate.record;
            Some(SearchResult {
                file_path: record.file_path,
                file_name: record.file_name,
                score: round3(score),
                excerpt: excerpt(&record.content),
            })
        })
        .collect();

    // sort_by is stable: equal scores keep store order
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(limit);
    results
}
