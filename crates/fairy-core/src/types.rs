//! Core types for File Fairy.
//!
//! ## Organizing
//! - [`FileEntry`]: A file observed during a directory scan
//! - [`ChangeEntry`]: One planned move/rename
//! - [`NameSource`]: How the new file name was chosen
//!
//! ## Extraction and chunking
//! - [`ExtractedContent`]: Text extracted from a file
//! - [`ChunkConfig`]: Window size and overlap, in characters
//! - [`ChunkOutput`]: A text window produced by a chunker
//!
//! ## Embeddings
//! - [`EmbeddingConfig`]: Configuration for embedding generation
//! - [`EmbeddingOutput`]: Result of embedding a text
//!
//! ## Index and search
//! - [`IndexRecord`]: A stored chunk with its embedding
//! - [`SearchQuery`]: Parameters for a store lookup
//! - [`Candidate`] / [`MatchSignal`]: Store hits before scoring
//! - [`SearchResult`] / [`SearchResponse`]: Ranked, user-facing results
//! - [`StoreStats`]: Index statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Scanned files
// ============================================================================

/// A file observed during a scan. Built fresh at scan time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Lower-cased extension with leading dot, empty when the file has none
    pub extension: String,
    /// Birth time, or modification time where the platform has none
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
    /// File size in bytes
    pub size_bytes: u64,
}

impl FileEntry {
    /// File name including the extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without the extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Normalize an extension to lower case with a leading dot.
///
/// `TXT`, `.txt` and `txt` all become `.txt`; an empty input stays empty.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// Extension of a path in [`normalize_extension`] form.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| normalize_extension(&e.to_string_lossy()))
        .unwrap_or_default()
}

// ============================================================================
// Plan entries
// ============================================================================

/// How the new name of a planned entry was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    /// Name kept as is
    Unchanged,
    /// A rename rule template
    Rule,
    /// The AI keyword template
    AiKeywords,
    /// A name suggested by the AI
    AiFilename,
}

/// One planned move/rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Current location
    pub from: PathBuf,
    /// Destination, unique within a plan
    pub to: PathBuf,
    /// Category folder the file lands in
    pub category: String,
    /// How the file name was chosen
    pub name_source: NameSource,
}

// ============================================================================
// Extraction
// ============================================================================

/// Content extracted from a file.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Main text content
    pub text: String,
    /// MIME type the extractor treated the file as
    pub mime_type: String,
}

// ============================================================================
// Chunking
// ============================================================================

/// Configuration for chunking. Sizes are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Window size
    pub size: usize,
    /// Characters shared by consecutive windows
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 400,
            overlap: 50,
        }
    }
}

/// Output from a chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    /// Chunk content
    pub content: String,
    /// Character range in the source text
    pub char_range: Range<usize>,
}

// ============================================================================
// Embedding
// ============================================================================

/// Configuration for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Normalize embeddings to unit length
    pub normalize: bool,
    /// Batch size for processing
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            batch_size: 32,
        }
    }
}

/// Output from embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Number of tokens in input
    pub token_count: usize,
}

// ============================================================================
// Index records
// ============================================================================

/// A stored chunk of a file together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Unique record identifier
    pub id: Uuid,
    /// Path of the source file
    pub file_path: PathBuf,
    /// Position of the chunk in the file (0-indexed)
    pub chunk_index: u32,
    /// Raw chunk text
    pub content: String,
    /// Display name of the source file
    pub file_name: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Search
// ============================================================================

/// A store lookup.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query embedding
    pub embedding: Vec<f32>,
    /// Raw query text, used for lexical matching
    pub text: Option<String>,
    /// Maximum candidates to return
    pub limit: usize,
}

/// How a store matched a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchSignal {
    /// Vector neighbour with a cosine distance
    Distance(f32),
    /// Native relevance score computed by the store
    Score(f32),
    /// Lexical match without a native score
    Lexical,
}

/// A record returned by a store lookup, before scoring.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: IndexRecord,
    pub signal: MatchSignal,
}

/// A ranked file match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Path of the matching file
    pub file_path: PathBuf,
    /// Display name of the matching file
    pub file_name: String,
    /// Similarity in [0, 1], rounded to 3 decimals
    pub score: f32,
    /// Start of the matching chunk
    pub excerpt: String,
}

/// Response of a hybrid search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    /// Failure detail when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    /// A successful response.
    pub fn ok(query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            success: true,
            query: query.into(),
            total_results: results.len(),
            results,
            error: None,
        }
    }

    /// A failed response with no results.
    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query: query.into(),
            results: Vec::new(),
            total_results: 0,
            error: Some(error.into()),
        }
    }
}

/// Vector store statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Distinct source files
    pub total_files: u64,
    /// Stored records
    pub total_chunks: u64,
    /// Creation time of the newest record
    pub last_updated: Option<DateTime<Utc>>,
}
