//! Vector storage layer for File Fairy.
//!
//! Two backends implement [`VectorStore`](fairy_core::VectorStore):
//!
//! | Store | Persistence | Isolation |
//! |-------|-------------|-----------|
//! | [`MemoryStore`] | none | one `RwLock` over the whole record map |
//! | [`SqliteStore`] | single SQLite file | one transaction per file replacement |
//!
//! Both answer searches by brute force over their records (see [`ranking`]):
//! vector neighbours carry a cosine distance, lexical matches on chunk text
//! or file name carry no native score and are scored by the searcher.
//!
//! # Example
//!
//! ```rust,ignore
//! use fairy_store::SqliteStore;
//! use fairy_core::VectorStore;
//!
//! let store = SqliteStore::open("index.db", 1024)?;
//! store.init().await?;
//! store.replace_file(path, records).await?;
//! let candidates = store.hybrid_search(&query).await?;
//! ```

pub mod memory;
pub mod ranking;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
