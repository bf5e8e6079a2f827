//! SQLite-backed store.
//!
//! Records live in a single `chunks` table. Embeddings are stored as
//! little-endian `f32` BLOBs, timestamps as RFC 3339 text in UTC. A file
//! replacement runs inside one transaction, so concurrent readers never see a
//! file with a mix of old and new chunks.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use fairy_core::{Candidate, IndexRecord, SearchQuery, StoreError, StoreStats, VectorStore};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ranking::{hybrid_candidates, vector_candidates};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    file_path TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    file_name TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_file_path ON chunks(file_path);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const SELECT_COLUMNS: &str =
    "SELECT id, file_path, chunk_index, content, file_name, embedding, created_at FROM chunks";

/// Persistent vector store on a single SQLite file.
pub struct SqliteStore {
    dimension: usize,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Init(format!("cannot open {}: {e}", path.display())))?;
        debug!("Opened SQLite store at {:?}", path);
        Ok(Self::from_connection(conn, dimension))
    }

    /// A store that lives only in memory, for tests.
    pub fn open_in_memory(dimension: usize) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Init(e.to_string()))?;
        Ok(Self::from_connection(conn, dimension))
    }

    fn from_connection(conn: Connection, dimension: usize) -> Self {
        Self {
            dimension,
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Embedding dimension records must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Query(format!("store task failed: {e}")))?
    }

    /// Every record, ordered by file path then chunk index.
    async fn all_records(&self) -> Result<Vec<IndexRecord>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("{SELECT_COLUMNS} ORDER BY file_path, chunk_index");
            let mut stmt = conn.prepare(&sql).map_err(query_err)?;
            let rows = stmt.query_map([], read_record).map_err(query_err)?;
            let records = rows
                .map(|r| r.map_err(query_err).and_then(|record| record))
                .collect::<Result<Vec<_>, _>>();
            records
        })
        .await
    }
}

fn query_err(e: rusqlite::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn write_dimension(conn: &Connection, dimension: usize) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('dimension', ?1)",
        params![dimension.to_string()],
    )
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("bad timestamp {text:?}: {e}")))
}

/// Raw row, decoded outside of rusqlite's error type.
type RawRow = (String, String, u32, String, String, Vec<u8>, String);

fn read_record(row: &Row<'_>) -> rusqlite::Result<Result<IndexRecord, StoreError>> {
    let raw: RawRow = (
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    );
    Ok(decode_row(raw))
}

fn decode_row(raw: RawRow) -> Result<IndexRecord, StoreError> {
    let (id, file_path, chunk_index, content, file_name, embedding, created_at) = raw;
    Ok(IndexRecord {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::Query(format!("bad id {id:?}: {e}")))?,
        file_path: PathBuf::from(file_path),
        chunk_index,
        content,
        file_name,
        embedding: decode_embedding(&embedding),
        created_at: decode_time(&created_at)?,
    })
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn init(&self) -> Result<(), StoreError> {
        let dimension = self.dimension;
        self.with_conn(move |conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| StoreError::Init(e.to_string()))?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| StoreError::Init(e.to_string()))?;

            let stored: Option<String> = conn
                .query_row(
                    "SELECT value FROM store_meta WHERE key = 'dimension'",
                    [],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| StoreError::Init(e.to_string()))?;

            if let Some(value) = stored.filter(|v| *v != dimension.to_string()) {
                let chunks: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(|e| StoreError::Init(e.to_string()))?;
                if chunks > 0 {
                    return Err(StoreError::Init(format!(
                        "index was built with dimension {value}, embedder produces {dimension}; clear the index to switch models"
                    )));
                }
            }
            write_dimension(conn, dimension).map_err(|e| StoreError::Init(e.to_string()))
        })
        .await?;
        info!("SQLite store ready (dimension: {})", self.dimension);
        Ok(())
    }

    async fn replace_file(
        &self,
        path: &Path,
        records: Vec<IndexRecord>,
    ) -> Result<(), StoreError> {
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != self.dimension) {
            return Err(StoreError::Insert(format!(
                "embedding dimension {} does not match store dimension {}",
                bad.embedding.len(),
                self.dimension
            )));
        }

        let key = path_key(path);
        let count = records.len();
        self.with_conn(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| StoreError::Insert(e.to_string()))?;
            tx.execute("DELETE FROM chunks WHERE file_path = ?1", params![key])
                .map_err(|e| StoreError::Delete(e.to_string()))?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO chunks (id, file_path, chunk_index, content, file_name, embedding, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    )
                    .map_err(|e| StoreError::Insert(e.to_string()))?;
                for record in &records {
                    stmt.execute(params![
                        record.id.to_string(),
                        key,
                        record.chunk_index,
                        record.content,
                        record.file_name,
                        encode_embedding(&record.embedding),
                        encode_time(&record.created_at),
                    ])
                    .map_err(|e| StoreError::Insert(e.to_string()))?;
                }
            }
            tx.commit().map_err(|e| StoreError::Insert(e.to_string()))
        })
        .await?;

        debug!("Replaced records of {:?} with {} chunks", path, count);
        Ok(())
    }

    async fn delete_by_file_path(&self, path: &Path) -> Result<u64, StoreError> {
        let key = path_key(path);
        let deleted = self
            .with_conn(move |conn| {
                conn.execute("DELETE FROM chunks WHERE file_path = ?1", params![key])
                    .map_err(|e| StoreError::Delete(e.to_string()))
            })
            .await?;
        debug!("Deleted {} chunks for {:?}", deleted, path);
        Ok(deleted as u64)
    }

    async fn update_file_path(&self, from: &Path, to: &Path) -> Result<u64, StoreError> {
        let from_key = path_key(from);
        let to_key = path_key(to);
        let file_name = to
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let updated = self
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE chunks SET file_path = ?1, file_name = ?2 WHERE file_path = ?3",
                    params![to_key, file_name, from_key],
                )
                .map_err(|e| StoreError::Insert(e.to_string()))
            })
            .await?;
        debug!("Updated {} chunks from {:?} to {:?}", updated, from, to);
        Ok(updated as u64)
    }

    async fn contains_file(&self, path: &Path) -> Result<bool, StoreError> {
        let key = path_key(path);
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM chunks WHERE file_path = ?1)",
                params![key],
                |row| row.get(0),
            )
            .map_err(query_err)
        })
        .await
    }

    async fn get_chunks_for_file(&self, path: &Path) -> Result<Vec<IndexRecord>, StoreError> {
        let key = path_key(path);
        self.with_conn(move |conn| {
            let sql = format!("{SELECT_COLUMNS} WHERE file_path = ?1 ORDER BY chunk_index");
            let mut stmt = conn.prepare(&sql).map_err(query_err)?;
            let rows = stmt.query_map(params![key], read_record).map_err(query_err)?;
            let records = rows
                .map(|r| r.map_err(query_err).and_then(|record| record))
                .collect::<Result<Vec<_>, _>>();
            records
        })
        .await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, StoreError> {
        let records = self.all_records().await?;
        Ok(vector_candidates(&records, query))
    }

    async fn hybrid_search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, StoreError> {
        let records = self.all_records().await?;
        Ok(hybrid_candidates(&records, query))
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let (files, chunks, last): (i64, i64, Option<String>) = self
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT COUNT(DISTINCT file_path), COUNT(*), MAX(created_at) FROM chunks",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .map_err(query_err)
            })
            .await?;

        Ok(StoreStats {
            total_files: files as u64,
            total_chunks: chunks as u64,
            last_updated: last.as_deref().map(decode_time).transpose()?,
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let dimension = self.dimension;
        let removed = self
            .with_conn(move |conn| {
                conn.execute_batch(SCHEMA)
                    .map_err(|e| StoreError::Init(e.to_string()))?;
                let removed = conn
                    .execute("DELETE FROM chunks", [])
                    .map_err(|e| StoreError::Delete(e.to_string()))?;
                write_dimension(conn, dimension).map_err(|e| StoreError::Delete(e.to_string()))?;
                Ok(removed)
            })
            .await?;
        info!("Cleared {} chunks from SQLite store", removed);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(query_err)
        })
        .await
    }
}
