//! Persistence layer for the book graph
//!
//! The whole graph is stored as one snapshot document:
//! - `codec`: JSON encoding of `GraphSnapshot`
//! - `storage`: the `SnapshotStorage` capability and its backends

pub mod codec;
pub mod storage;

pub use storage::{JsonFileStorage, MemoryStorage, SnapshotStorage};

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
