//! Configuration handling for File Fairy.
//!
//! The config file lives at `<config_dir>/config.toml`. Every field has a
//! default, so a missing file or a partial file is fine.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Organizer configuration
    #[serde(default)]
    pub organize: OrganizeConfig,

    /// Index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// LLM backend configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicitly given path must exist.
    pub fn load_from(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => match Self::config_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        check_threshold(config.query.threshold)?;
        Ok(config)
    }

    /// Default config file location.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Where the rule table is read from.
    pub fn rules_path(&self) -> Option<PathBuf> {
        self.organize
            .rules_file
            .clone()
            .or_else(|| config_dir().map(|dir| dir.join(fairy_organize::RULES_FILE_NAME)))
    }

    /// Where the index database lives.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.index
            .db_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("index.db")))
    }

    /// A commented sample config with every default spelled out.
    pub fn sample_toml() -> String {
        r#"# File Fairy configuration

[organize]
# rules_file = "~/.config/fairy/rules.toml"
# log_file = "~/fairy.log"
ai_keywords = false
ai_filename = false
ai_folder = false
concurrency = 4
update_index = true
# larger files are named by the rules alone
max_file_size = 52428800
# send representative chunks of long documents instead of the full text
key_chunks = true
key_chunk_clusters = 4

[index]
# db_path = "~/.local/share/fairy/index.db"
recursive = true
extensions = [".txt", ".md", ".csv", ".json", ".log"]

[embedding]
# ollama, hash or noop
provider = "ollama"
model = "dengcao/Qwen3-Embedding-0.6B:Q8_0"
dimension = 1024
max_concurrent = 4

[llm]
base_url = "http://localhost:11434"
model = "gemma3:4b"
timeout_secs = 30

[chunking]
size = 400
overlap = 50

[query]
default_limit = 10
max_limit = 100
threshold = 0.7
hybrid = true

[logging]
level = "info"
"#
        .to_string()
    }
}

/// Organizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeConfig {
    /// Rule table file (default: `<config_dir>/rules.toml`)
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    /// Operation log file, used when `--log` is given without a path
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Ask the LLM for keywords
    #[serde(default)]
    pub ai_keywords: bool,

    /// Ask the LLM for a new file name
    #[serde(default)]
    pub ai_filename: bool,

    /// Ask the LLM for a destination folder
    #[serde(default)]
    pub ai_folder: bool,

    /// Files analysed at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Follow moves in the index when one exists
    #[serde(default = "default_true")]
    pub update_index: bool,

    /// Files above this many bytes skip AI analysis
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Reduce long documents to their key chunks before asking the LLM
    #[serde(default = "default_true")]
    pub key_chunks: bool,

    /// Key chunks picked per document
    #[serde(default = "default_key_chunk_clusters")]
    pub key_chunk_clusters: usize,
}

fn default_concurrency() -> usize {
    4
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

fn default_key_chunk_clusters() -> usize {
    fairy_organize::key_chunks::DEFAULT_CLUSTERS
}

fn default_true() -> bool {
    true
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            log_file: None,
            ai_keywords: false,
            ai_filename: false,
            ai_folder: false,
            concurrency: default_concurrency(),
            update_index: true,
            max_file_size: default_max_file_size(),
            key_chunks: true,
            key_chunk_clusters: default_key_chunk_clusters(),
        }
    }
}

/// Index-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Database file (default: `<data_dir>/index.db`)
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Extensions to index; empty means every supported file
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    [".txt", ".md", ".csv", ".json", ".log"]
        .iter()
        .map(|e| (*e).to_string())
        .collect()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            recursive: true,
            extensions: default_extensions(),
        }
    }
}

/// Which embedder backs the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Ollama `/api/embed`
    #[default]
    Ollama,
    /// Deterministic offline hashing
    Hash,
    /// Zero vectors, lexical ranking only
    Noop,
}

/// Embedding-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Max concurrent embedding jobs
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_embedding_model() -> String {
    fairy_llm::DEFAULT_EMBED_MODEL.to_string()
}

fn default_dimension() -> usize {
    fairy_llm::DEFAULT_EMBED_DIMENSION
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// LLM backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Generation model used for suggestions
    #[serde(default = "default_gen_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    fairy_llm::DEFAULT_OLLAMA_URL.to_string()
}

fn default_gen_model() -> String {
    fairy_llm::DEFAULT_GEN_MODEL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_gen_model(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Chunking-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size (characters)
    #[serde(default = "default_chunk_size")]
    pub size: usize,

    /// Overlap between chunks (characters)
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    400
}

fn default_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

/// Query-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default result limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Maximum result limit
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Default similarity threshold
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Enable hybrid search (vector + lexical)
    #[serde(default = "default_true")]
    pub hybrid: bool,
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_threshold() -> f32 {
    0.7
}

/// Similarity thresholds must lie in `[0, 1]`.
pub fn check_threshold(threshold: f32) -> anyhow::Result<f32> {
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("threshold must be between 0.0 and 1.0, got {threshold}");
    }
    Ok(threshold)
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            threshold: default_threshold(),
            hybrid: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the XDG data directory for File Fairy.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FAIRY_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "fairy").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the XDG config directory for File Fairy.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FAIRY_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "fairy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
