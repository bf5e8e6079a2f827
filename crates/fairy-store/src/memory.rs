//! In-memory store.
//!
//! [`MemoryStore`] keeps every record in one map behind a single `RwLock`.
//! A file replacement takes the write lock once, so readers either see all of
//! the old records of a file or all of the new ones.
//!
//! Records are keyed by `(file_path, chunk_index)`, so scans run in the same
//! order as the SQLite store's and equal scores tie-break identically.

use async_trait::async_trait;
use fairy_core::{Candidate, IndexRecord, SearchQuery, StoreError, StoreStats, VectorStore};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ranking::{hybrid_candidates, vector_candidates};

/// In-memory vector store.
///
/// Search is brute force over all records. Suitable for tests and short-lived
/// sessions; nothing survives the process.
///
/// # Example
///
/// ```rust
/// use fairy_store::MemoryStore;
/// use fairy_core::VectorStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new(1024);
/// store.init().await?;
///
/// let stats = store.stats().await?;
/// assert_eq!(stats.total_chunks, 0);
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    dimension: usize,
    records: Arc<RwLock<BTreeMap<RecordKey, IndexRecord>>>,
}

type RecordKey = (PathBuf, u32);

impl MemoryStore {
    /// Create a new in-memory store with the given embedding dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Embedding dimension records must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, records: &[IndexRecord]) -> Result<(), StoreError> {
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != self.dimension) {
            return Err(StoreError::Insert(format!(
                "embedding dimension {} does not match store dimension {}",
                bad.embedding.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        debug!("MemoryStore initialized (dimension: {})", self.dimension);
        Ok(())
    }

    async fn replace_file(
        &self,
        path: &Path,
        records: Vec<IndexRecord>,
    ) -> Result<(), StoreError> {
        self.check_dimension(&records)?;

        let mut store = self.records.write().await;
        store.retain(|_, r| r.file_path != path);
        let count = records.len();
        for mut record in records {
            record.file_path = path.to_path_buf();
            store.insert((record.file_path.clone(), record.chunk_index), record);
        }
        debug!("Replaced records of {:?} with {} chunks", path, count);
        Ok(())
    }

    async fn delete_by_file_path(&self, path: &Path) -> Result<u64, StoreError> {
        let mut store = self.records.write().await;
        let before = store.len();
        store.retain(|_, r| r.file_path != path);
        let deleted = (before - store.len()) as u64;
        debug!("Deleted {} chunks for {:?}", deleted, path);
        Ok(deleted)
    }

    async fn update_file_path(&self, from: &Path, to: &Path) -> Result<u64, StoreError> {
        let mut store = self.records.write().await;
        let file_name = to
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let keys: Vec<RecordKey> = store
            .keys()
            .filter(|(path, _)| path == from)
            .cloned()
            .collect();
        let updated = keys.len() as u64;
        for key in keys {
            if let Some(mut record) = store.remove(&key) {
                record.file_path = to.to_path_buf();
                record.file_name = file_name.clone();
                store.insert((record.file_path.clone(), record.chunk_index), record);
            }
        }
        debug!("Updated {} chunks from {:?} to {:?}", updated, from, to);
        Ok(updated)
    }

    async fn contains_file(&self, path: &Path) -> Result<bool, StoreError> {
        let store = self.records.read().await;
        Ok(store.values().any(|r| r.file_path == path))
    }

    async fn get_chunks_for_file(&self, path: &Path) -> Result<Vec<IndexRecord>, StoreError> {
        let store = self.records.read().await;
        Ok(store
            .values()
            .filter(|r| r.file_path == path)
            .cloned()
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, StoreError> {
        let store = self.records.read().await;
        Ok(vector_candidates(store.values(), query))
    }

    async fn hybrid_search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, StoreError> {
        let store = self.records.read().await;
        Ok(hybrid_candidates(store.values(), query))
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let store = self.records.read().await;
        let files: HashSet<&PathBuf> = store.values().map(|r| &r.file_path).collect();

        Ok(StoreStats {
            total_files: files.len() as u64,
            total_chunks: store.len() as u64,
            last_updated: store.values().map(|r| r.created_at).max(),
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut store = self.records.write().await;
        let removed = store.len();
        store.clear();
        debug!("Cleared {} chunks", removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fairy_core::MatchSignal;
    use uuid::Uuid;

    fn create_test_record(path: &str, index: u32, content: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: Uuid::new_v4(),
            file_path: PathBuf::from(path),
            chunk_index: index,
            content: content.to_string(),
            file_name: Path::new(path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
            embedding,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_replace_and_stats() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();

        let path = Path::new("/test/file.txt");
        store
            .replace_file(
                path,
                vec![
                    create_test_record("/test/file.txt", 0, "one", vec![1.0, 0.0, 0.0]),
                    create_test_record("/test/file.txt", 1, "two", vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.total_files, 1);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_replace_file_drops_previous_records() {
        let store = MemoryStore::new(3);
        let path = Path::new("/test/file.txt");

        store
            .replace_file(
                path,
                vec![
                    create_test_record("/test/file.txt", 0, "old a", vec![1.0, 0.0, 0.0]),
                    create_test_record("/test/file.txt", 1, "old b", vec![1.0, 0.0, 0.0]),
                    create_test_record("/test/file.txt", 2, "old c", vec![1.0, 0.0, 0.0]),
                ],
            )
            .await
            .unwrap();
        store
            .replace_file(
                path,
                vec![create_test_record("/test/file.txt", 0, "new", vec![0.0, 1.0, 0.0])],
            )
            .await
            .unwrap();

        let chunks = store.get_chunks_for_file(path).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "new");
    }

    #[tokio::test]
    async fn test_replace_file_rejects_wrong_dimension() {
        let store = MemoryStore::new(3);
        let path = Path::new("/test/file.txt");
        store
            .replace_file(path, vec![create_test_record("/test/file.txt", 0, "keep", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let err = store
            .replace_file(path, vec![create_test_record("/test/file.txt", 0, "bad", vec![1.0])])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Insert(_)));
        assert_eq!(store.get_chunks_for_file(path).await.unwrap()[0].content, "keep");
    }

    #[tokio::test]
    async fn test_delete_by_file_path_is_idempotent() {
        let store = MemoryStore::new(3);
        store
            .replace_file(
                Path::new("/test/file1.txt"),
                vec![create_test_record("/test/file1.txt", 0, "a", vec![1.0, 0.0, 0.0])],
            )
            .await
            .unwrap();
        store
            .replace_file(
                Path::new("/test/file2.txt"),
                vec![create_test_record("/test/file2.txt", 0, "b", vec![0.0, 1.0, 0.0])],
            )
            .await
            .unwrap();

        assert_eq!(store.delete_by_file_path(Path::new("/test/file1.txt")).await.unwrap(), 1);
        assert_eq!(store.delete_by_file_path(Path::new("/test/file1.txt")).await.unwrap(), 0);

        assert!(!store.contains_file(Path::new("/test/file1.txt")).await.unwrap());
        assert!(store.contains_file(Path::new("/test/file2.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_file_path() {
        let store = MemoryStore::new(3);
        store
            .replace_file(
                Path::new("/in/old.txt"),
                vec![create_test_record("/in/old.txt", 0, "a", vec![1.0, 0.0, 0.0])],
            )
            .await
            .unwrap();

        let updated = store
            .update_file_path(Path::new("/in/old.txt"), Path::new("/out/Docs/new.txt"))
            .await
            .unwrap();

        assert_eq!(updated, 1);
        let chunks = store
            .get_chunks_for_file(Path::new("/out/Docs/new.txt"))
            .await
            .unwrap();
        assert_eq!(chunks[0].file_name, "new.txt");
        assert!(!store.contains_file(Path::new("/in/old.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_returns_nearest_first() {
        let store = MemoryStore::new(3);
        store
            .replace_file(
                Path::new("/test/file.txt"),
                vec![
                    create_test_record("/test/file.txt", 0, "x", vec![1.0, 0.0, 0.0]),
                    create_test_record("/test/file.txt", 1, "y", vec![0.0, 1.0, 0.0]),
                    create_test_record("/test/file.txt", 2, "z", vec![0.0, 0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let query = SearchQuery {
            embedding: vec![1.0, 0.0, 0.0],
            text: None,
            limit: 2,
        };
        let results = store.search(&query).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.content, "x");
        assert!(matches!(results[0].signal, MatchSignal::Distance(d) if d.abs() < 0.001));
    }

    #[tokio::test]
    async fn test_hybrid_search_includes_lexical_matches() {
        let store = MemoryStore::new(2);
        store
            .replace_file(
                Path::new("/docs/budget.txt"),
                vec![create_test_record("/docs/budget.txt", 0, "annual budget", vec![0.0, 0.0])],
            )
            .await
            .unwrap();

        let query = SearchQuery {
            embedding: vec![1.0, 0.0],
            text: Some("budget".to_string()),
            limit: 5,
        };
        let results = store.hybrid_search(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].signal, MatchSignal::Lexical);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_path_order() {
        let store = MemoryStore::new(2);
        for path in ["/d/c.txt", "/d/a.txt", "/d/b.txt"] {
            store
                .replace_file(
                    Path::new(path),
                    vec![
                        create_test_record(path, 1, "same", vec![1.0, 0.0]),
                        create_test_record(path, 0, "same", vec![1.0, 0.0]),
                    ],
                )
                .await
                .unwrap();
        }

        let query = SearchQuery {
            embedding: vec![1.0, 0.0],
            text: None,
            limit: 6,
        };
        for _ in 0..3 {
            let order: Vec<(String, u32)> = store
                .search(&query)
                .await
                .unwrap()
                .into_iter()
                .map(|c| (c.record.file_name, c.record.chunk_index))
                .collect();
            assert_eq!(
                order,
                vec![
                    ("a.txt".to_string(), 0),
                    ("a.txt".to_string(), 1),
                    ("b.txt".to_string(), 0),
                    ("b.txt".to_string(), 1),
                    ("c.txt".to_string(), 0),
                    ("c.txt".to_string(), 1),
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_stats_last_updated_is_newest() {
        let store = MemoryStore::new(1);
        let mut old = create_test_record("/a.txt", 0, "a", vec![1.0]);
        old.created_at = Utc::now() - Duration::days(2);
        let new = create_test_record("/b.txt", 0, "b", vec![1.0]);
        let newest = new.created_at;

        store.replace_file(Path::new("/a.txt"), vec![old]).await.unwrap();
        store.replace_file(Path::new("/b.txt"), vec![new]).await.unwrap();

        assert_eq!(store.stats().await.unwrap().last_updated, Some(newest));
    }

    #[tokio::test]
    async fn test_clear_keeps_store_usable() {
        let store = MemoryStore::new(1);
        store
            .replace_file(Path::new("/a.txt"), vec![create_test_record("/a.txt", 0, "a", vec![1.0])])
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());

        store
            .replace_file(Path::new("/a.txt"), vec![create_test_record("/a.txt", 0, "a", vec![1.0])])
            .await
            .unwrap();
        assert_eq!(store.stats().await.unwrap().total_chunks, 1);
    }
}
