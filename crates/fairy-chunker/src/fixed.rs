//! Fixed-size chunking strategy with overlap.

use async_trait::async_trait;
use fairy_core::{ChunkConfig, ChunkError, ChunkOutput, Chunker};

/// Split `text` into windows of `size` characters sharing `overlap`
/// characters with their predecessor.
///
/// Window `i` starts at `i * (size - overlap)`. The last window may be
/// shorter, and no window is emitted once the previous one reached the end
/// of the text. Empty or whitespace-only text yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    Ok(chunk_windows(text, size, overlap)?
        .into_iter()
        .map(|c| c.content)
        .collect())
}

fn chunk_windows(text: &str, size: usize, overlap: usize) -> Result<Vec<ChunkOutput>, ChunkError> {
    if size == 0 {
        return Err(ChunkError::InvalidConfig(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= size {
        return Err(ChunkError::InvalidConfig(format!(
            "overlap ({overlap}) must be smaller than chunk size ({size})"
        )));
    }
    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let step = size - overlap;

    let mut chunks = Vec::with_capacity(total / step + 1);
    let mut start = 0;
    while start < total {
        let end = (start + size).min(total);
        chunks.push(ChunkOutput {
            content: chars[start..end].iter().collect(),
            char_range: start..end,
        });
        if end >= total {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Fixed-size chunker with configurable overlap.
pub struct FixedSizeChunker;

impl FixedSizeChunker {
    /// Create a new fixed-size chunker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chunker for FixedSizeChunker {
    fn name(&self) -> &str {
        "fixed_size"
    }

    async fn chunk(
        &self,
        text: &str,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError> {
        chunk_windows(text, config.size, config.overlap)
    }
}
