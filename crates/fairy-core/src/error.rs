//! Error types for File Fairy.

use thiserror::Error;

/// Main error type for File Fairy operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Rule table is missing or invalid
    #[error("rule error: {0}")]
    Rules(#[from] RuleError),

    /// AI suggestion failed
    #[error("suggestion error: {0}")]
    Suggestion(#[from] SuggestError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Content extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("no chunks produced: {0}")]
    Empty(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("store is closed")]
    Closed,
}

/// Rule table errors. These are configuration errors: they are reported
/// before any scan starts.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("cannot read rules file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse rules file: {0}")]
    Parse(String),

    #[error("invalid rule: {0}")]
    Invalid(String),
}

/// AI suggestion errors.
///
/// Suggesters turn every "no usable answer" case, including sentinel
/// strings returned by a model, into one of these variants so callers only
/// ever branch on `Ok`/`Err`.
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("suggestion backend unavailable: {0}")]
    Unavailable(String),

    #[error("no usable suggestion: {0}")]
    NoResult(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Result type alias for File Fairy operations.
pub type Result<T> = std::result::Result<T, Error>;
