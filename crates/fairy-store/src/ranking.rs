//! Brute-force candidate selection shared by the stores.

use fairy_core::relevance::text_relevance;
use fairy_core::{Candidate, IndexRecord, MatchSignal, SearchQuery};
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

/// Cosine similarity, or `None` when either vector has no direction or the
/// dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot / (norm_a * norm_b))
}

/// The `query.limit` nearest records, closest first, each carrying its
/// cosine distance.
pub fn vector_candidates<'a, I>(records: I, query: &SearchQuery) -> Vec<Candidate>
where
    I: IntoIterator<Item = &'a IndexRecord>,
{
    let mut scored: Vec<(f32, &IndexRecord)> = records
        .into_iter()
        .filter_map(|record| {
            cosine_similarity(&query.embedding, &record.embedding).map(|sim| (1.0 - sim, record))
        })
        .collect();

    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .take(query.limit)
        .map(|(distance, record)| Candidate {
            record: record.clone(),
            signal: MatchSignal::Distance(distance),
        })
        .collect()
}

/// Vector neighbours followed by up to `query.limit` lexical matches that
/// are not already among them.
pub fn hybrid_candidates<'a, I>(records: I, query: &SearchQuery) -> Vec<Candidate>
where
    I: IntoIterator<Item = &'a IndexRecord> + Clone,
{
    let mut candidates = vector_candidates(records.clone(), query);

    let Some(text) = query.text.as_deref().filter(|t| !t.trim().is_empty()) else {
        return candidates;
    };

    let seen: HashSet<Uuid> = candidates.iter().map(|c| c.record.id).collect();
    let mut lexical: Vec<(f32, &IndexRecord)> = records
        .into_iter()
        .filter(|record| !seen.contains(&record.id))
        .map(|record| (text_relevance(text, &record.content, &record.file_name), record))
        .filter(|(relevance, _)| *relevance > 0.0)
        .collect();

    lexical.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    candidates.extend(lexical.into_iter().take(query.limit).map(|(_, record)| Candidate {
        record: record.clone(),
        signal: MatchSignal::Lexical,
    }));

    candidates
}
