//! Main indexing service.

use chrono::Utc;
use fairy_chunker::FixedSizeChunker;
use fairy_core::{
    extension_of, normalize_extension, ChunkConfig, ChunkError, Chunker, EmbeddingConfig, Error,
    IndexRecord, Result, SearchResponse, StoreError, StoreStats, VectorStore,
};
use fairy_embed::EmbedderPool;
use fairy_extract::ExtractorRegistry;
use fairy_query::HybridSearcher;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Index update events.
#[derive(Debug, Clone)]
pub enum IndexUpdate {
    IndexingStarted { path: PathBuf },
    FileIndexed { path: PathBuf, chunk_count: u32 },
    FileRemoved { path: PathBuf },
    FileError { path: PathBuf, error: String },
}

/// Configuration for the index service.
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Chunk configuration
    pub chunk_config: ChunkConfig,
    /// Embedding configuration
    pub embed_config: EmbeddingConfig,
}

/// Outcome of [`IndexService::index_folder`].
#[derive(Debug, Clone, Default)]
pub struct FolderReport {
    /// Files indexed, with their chunk counts
    pub indexed: Vec<(PathBuf, u32)>,
    /// Files that failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl FolderReport {
    /// Chunks written across all indexed files.
    pub fn total_chunks(&self) -> u64 {
        self.indexed.iter().map(|(_, n)| u64::from(*n)).sum()
    }
}

/// Single-writer index service.
///
/// Writes (`upsert`, `remove`, `rename`, `clear`) are serialised by one async
/// lock. Readers go straight to the store, which keeps them isolated from a
/// replacement in flight.
pub struct IndexService {
    /// Vector store
    store: Arc<dyn VectorStore>,
    /// Embedder pool
    embedder: Arc<EmbedderPool>,
    /// Extractor registry
    extractors: Arc<ExtractorRegistry>,
    chunker: FixedSizeChunker,
    searcher: HybridSearcher,
    config: IndexConfig,
    /// Global write lock
    write_lock: Mutex<()>,
    closed: AtomicBool,
    /// Update broadcast
    update_tx: broadcast::Sender<IndexUpdate>,
}

impl IndexService {
    /// Create a new index service with the built-in extractors.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<EmbedderPool>,
        config: IndexConfig,
    ) -> Self {
        Self::with_extractors(
            store,
            embedder,
            Arc::new(ExtractorRegistry::with_defaults()),
            config,
        )
    }

    /// Create a new index service with a custom extractor registry.
    pub fn with_extractors(
        store: Arc<dyn VectorStore>,
        embedder: Arc<EmbedderPool>,
        extractors: Arc<ExtractorRegistry>,
        config: IndexConfig,
    ) -> Self {
        let (update_tx, _) = broadcast::channel(256);
        let searcher = HybridSearcher::new(Arc::clone(&store), Arc::clone(&embedder));

        Self {
            store,
            embedder,
            extractors,
            chunker: FixedSizeChunker::new(),
            searcher,
            config,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            update_tx,
        }
    }

    /// Subscribe to index updates.
    pub fn subscribe(&self) -> broadcast::Receiver<IndexUpdate> {
        self.update_tx.subscribe()
    }

    /// Initialize the underlying store.
    pub async fn init(&self) -> Result<()> {
        self.store.init().await?;
        info!(
            "Index ready (model: {}, dimension: {})",
            self.embedder.model_name(),
            self.embedder.dimension()
        );
        Ok(())
    }

    /// Flush the store and refuse further writes.
    pub async fn shutdown(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.store.flush().await?;
        info!("Index closed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed.into());
        }
        Ok(())
    }

    /// Chunk, embed and store `text` as the full content of `path`.
    ///
    /// All previous records of `path` are replaced in one step. Text that
    /// yields no chunks is an error and leaves existing records untouched.
    pub async fn upsert(&self, path: &Path, text: &str, display_name: &str) -> Result<u32> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let chunks = self.chunker.chunk(text, &self.config.chunk_config).await?;
        if chunks.is_empty() {
            return Err(ChunkError::Empty(path.display().to_string()).into());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts, &self.config.embed_config)
            .await?;

        let now = Utc::now();
        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(idx, (chunk, embedded))| IndexRecord {
                id: Uuid::new_v4(),
                file_path: path.to_path_buf(),
                chunk_index: idx as u32,
                content: chunk.content,
                file_name: display_name.to_string(),
                embedding: embedded.embedding,
                created_at: now,
            })
            .collect();

        let chunk_count = records.len() as u32;
        self.store.replace_file(path, records).await?;
        debug!("Upserted {:?} ({} chunks)", path, chunk_count);
        Ok(chunk_count)
    }

    /// Delete every record of `path`. Removing an unknown path is a no-op.
    pub async fn remove(&self, path: &Path) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let removed = self.store.delete_by_file_path(path).await?;
        if removed > 0 {
            info!("Removed {:?} from index ({} chunks)", path, removed);
            let _ = self.update_tx.send(IndexUpdate::FileRemoved {
                path: path.to_path_buf(),
            });
        }
        Ok(removed)
    }

    /// Re-point the records of a moved file.
    pub async fn rename(&self, from: &Path, to: &Path) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let moved = self.store.update_file_path(from, to).await?;
        debug!("Re-pointed {} chunks {:?} -> {:?}", moved, from, to);
        Ok(moved)
    }

    /// Drop all records. The index stays usable.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        self.store.clear().await?;
        info!("Index cleared");
        Ok(())
    }

    /// Whether any record exists for `path`.
    pub async fn is_indexed(&self, path: &Path) -> Result<bool> {
        Ok(self.store.contains_file(path).await?)
    }

    /// Store statistics.
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.store.stats().await?)
    }

    /// Hybrid search over the index.
    pub async fn search(&self, query: &str, limit: usize, threshold: f32) -> SearchResponse {
        self.searcher.search(query, limit, threshold).await
    }

    /// Extract a file and index its text under its file name.
    pub async fn index_file(&self, path: &Path) -> Result<u32> {
        let _ = self.update_tx.send(IndexUpdate::IndexingStarted {
            path: path.to_path_buf(),
        });

        match self.extract_and_upsert(path).await {
            Ok(chunk_count) => {
                info!("Indexed {:?} ({} chunks)", path, chunk_count);
                let _ = self.update_tx.send(IndexUpdate::FileIndexed {
                    path: path.to_path_buf(),
                    chunk_count,
                });
                Ok(chunk_count)
            }
            Err(e) => {
                error!("Failed to index {:?}: {}", path, e);
                let _ = self.update_tx.send(IndexUpdate::FileError {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn extract_and_upsert(&self, path: &Path) -> Result<u32> {
        let content = self.extractors.extract_file(path).await?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.upsert(path, &content.text, &display_name).await
    }

    /// Index every supported file in `folder`.
    ///
    /// Hidden files and directories are skipped. When `extensions` is given
    /// only files with one of them are considered. A failing file is
    /// reported and never stops the rest of the folder.
    pub async fn index_folder(
        &self,
        folder: &Path,
        recursive: bool,
        extensions: Option<&[String]>,
    ) -> Result<FolderReport> {
        self.ensure_open()?;
        if !folder.is_dir() {
            return Err(Error::Other(format!("not a directory: {}", folder.display())));
        }

        let root = folder.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&root, recursive))
            .await
            .map_err(|e| Error::Other(format!("scan task failed: {e}")))?;

        let wanted: Option<Vec<String>> =
            extensions.map(|exts| exts.iter().map(|e| normalize_extension(e)).collect());

        let candidates: Vec<PathBuf> = files
            .into_iter()
            .filter(|path| {
                wanted
                    .as_ref()
                    .map_or(true, |exts| exts.contains(&extension_of(path)))
            })
            .filter(|path| self.extractors.supports(path))
            .collect();

        info!("Indexing {} files in {:?}", candidates.len(), folder);

        let mut report = FolderReport::default();
        for path in candidates {
            match self.index_file(&path).await {
                Ok(chunk_count) => report.indexed.push((path, chunk_count)),
                Err(e) => report.failed.push((path, e.to_string())),
            }
        }

        info!(
            "Folder {:?}: {} indexed, {} failed",
            folder,
            report.indexed.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Regular, non-hidden files under `root`, sorted.
fn collect_files(root: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(root).follow_links(false);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cannot read entry under {:?}: {}", root, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}
