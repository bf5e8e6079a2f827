//! Key-chunk selection for AI naming.
//!
//! Long documents are cut into chunks, embedded, and grouped with k-means.
//! The chunk nearest each centroid represents its group; the representatives
//! are handed to the suggester in document order instead of the full text.

use fairy_chunker::chunk_text;
use fairy_core::{ChunkConfig, EmbeddingConfig, Result};
use fairy_embed::EmbedderPool;
use std::sync::Arc;
use tracing::debug;

/// Representatives picked per document
pub const DEFAULT_CLUSTERS: usize = 4;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f32 = 1e-5;

/// Picks the chunks that best represent a document.
pub struct KeyChunkSelector {
    embedder: Arc<EmbedderPool>,
    chunk_config: ChunkConfig,
    embed_config: EmbeddingConfig,
    clusters: usize,
}

impl KeyChunkSelector {
    pub fn new(embedder: Arc<EmbedderPool>, chunk_config: ChunkConfig) -> Self {
        Self {
            embedder,
            chunk_config,
            embed_config: EmbeddingConfig::default(),
            clusters: DEFAULT_CLUSTERS,
        }
    }

    #[must_use]
    pub fn with_clusters(mut self, clusters: usize) -> Self {
        self.clusters = clusters.max(1);
        self
    }

    /// The text to analyse in place of `text`. Short texts come back as is.
    pub async fn select(&self, text: &str) -> Result<String> {
        let chunks = chunk_text(text, self.chunk_config.size, self.chunk_config.overlap)?;
        if chunks.len() <= self.clusters {
            return Ok(text.to_string());
        }

        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let points: Vec<Vec<f32>> = self
            .embedder
            .embed_batch(&refs, &self.embed_config)
            .await?
            .into_iter()
            .map(|o| o.embedding)
            .collect();

        let picked = representatives(&points, self.clusters);
        debug!("Picked chunks {:?} of {}", picked, chunks.len());

        Ok(picked
            .into_iter()
            .map(|i| chunks[i].as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

fn distance2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, c) in centroids.iter().enumerate() {
        let d = distance2(point, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Indices of the points closest to each of `k` k-means centroids, sorted
/// and deduplicated.
///
/// Seeding is farthest-point from the first point, so the result depends
/// only on the input.
pub fn representatives(points: &[Vec<f32>], k: usize) -> Vec<usize> {
    if points.len() <= k {
        return (0..points.len()).collect();
    }

    let mut centroids = vec![points[0].clone()];
    while centroids.len() < k {
        let next = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, distance2(p, &centroids[nearest(p, &centroids)])))
            .fold((0, -1.0f32), |best, cur| if cur.1 > best.1 { cur } else { best })
            .0;
        centroids.push(points[next].clone());
    }

    let dim = points[0].len();
    let mut labels = vec![0; points.len()];
    for _ in 0..MAX_ITERATIONS {
        for (label, p) in labels.iter_mut().zip(points) {
            *label = nearest(p, &centroids);
        }

        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (&label, p) in labels.iter().zip(points) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(p) {
                *s += v;
            }
        }

        let mut shift = 0.0f32;
        for (c, (sum, count)) in centroids.iter_mut().zip(sums.into_iter().zip(counts)) {
            // empty clusters keep their centroid
            if count == 0 {
                continue;
            }
            let moved: Vec<f32> = sum.into_iter().map(|s| s / count as f32).collect();
            shift = shift.max(distance2(c, &moved));
            *c = moved;
        }
        if shift <= TOLERANCE {
            break;
        }
    }

    let mut picked: Vec<usize> = centroids
        .iter()
        .map(|c| {
            points
                .iter()
                .enumerate()
                .fold((0, f32::MAX), |best, (i, p)| {
                    let d = distance2(p, c);
                    if d < best.1 {
                        (i, d)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect();
    picked.sort_unstable();
    picked.dedup();
    picked
}
