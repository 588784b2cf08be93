//! Record storage and database layer for the vector cache.
//!
//! The index core holds only vectors; this crate binds it to durable
//! records. A [`Record`] carries one or more embeddings plus arbitrary
//! JSON payload, persisted through a pluggable [`RecordStore`] (one
//! JSON file per record in the [`FileStore`] implementation). The
//! [`Database`] ties a store to an index table, keeps the
//! internal-ID-to-record [`Registry`] in both directions, and rebuilds
//! the whole index by replaying the store on open — the index itself
//! is never persisted.
//!
//! A [`Catalog`] maps database names to their configuration so several
//! named databases can share one deployment.

mod catalog;
mod database;
mod file;
mod record;
mod registry;
mod storage;

pub use catalog::{Catalog, DatabaseSpec};
pub use database::{Database, SearchHit};
pub use file::FileStore;
pub use record::{record_id, Record};
pub use registry::Registry;
pub use storage::RecordStore;

/// Error type for store and database operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index error: {0}")]
    Index(#[from] recall_core::Error),

    #[error("record has no embeddings")]
    EmptyRecord,

    #[error("record has no id assigned")]
    UnnamedRecord,

    #[error("record already exists: {0}")]
    DuplicateRecord(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("embedding {index} has {actual} dimensions, expected {expected}")]
    EmbeddingDimensions {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("no record registered for vector id {0}")]
    UnresolvedId(i32),

    #[error("no matching records")]
    NoMatch,

    #[error("database '{0}' already exists")]
    DatabaseExists(String),

    #[error("database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("a '{kind}' database with uri '{uri}' already exists")]
    DuplicateUri { kind: String, uri: String },
}

/// Result type for store and database operations.
pub type Result<T> = std::result::Result<T, Error>;
