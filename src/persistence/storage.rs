//! Snapshot storage backends
//!
//! A backend only has to load and save a whole snapshot. The graph manager
//! never sees the medium behind it.

use super::{codec, PersistenceResult};
use crate::graph::GraphSnapshot;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::debug;

/// Durable home of the graph snapshot
pub trait SnapshotStorage: Send + Sync {
    /// Read the stored snapshot. An absent or empty store is the empty graph.
    fn load(&self) -> PersistenceResult<GraphSnapshot>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()>;

    /// Human-readable location, used in log records
    fn describe(&self) -> String;
}

impl<T: SnapshotStorage + ?Sized> SnapshotStorage for Arc<T> {
    fn load(&self) -> PersistenceResult<GraphSnapshot> {
        (**self).load()
    }

    fn save(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()> {
        (**self).save(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Snapshot stored as a single JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Use `path` as the snapshot file, creating its directory if missing
    pub fn new(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;
        Ok(Self { path })
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> PersistenceResult<GraphSnapshot> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {:?}, starting empty", self.path);
                return Ok(GraphSnapshot::empty());
            }
            Err(e) => return Err(e.into()),
        };
        codec::decode(&bytes)
    }

    /// Write to a uniquely named temp file in the same directory, sync it,
    /// then rename it over the target. A crash leaves either the old or the
    /// new document in place.
    fn save(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()> {
        let bytes = codec::encode(snapshot)?;
        ensure_parent_dir(&self.path)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            "Saved snapshot ({} nodes, {} edges) to {:?}",
            snapshot.nodes.len(),
            snapshot.edges.len(),
            self.path
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn ensure_parent_dir(path: &Path) -> PersistenceResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// In-process snapshot storage
///
/// Holds the encoded document in memory, so it goes through the same codec
/// as the file backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<Vec<u8>>>,
    saves: Mutex<usize>,
}

impl MemoryStorage {
    /// Storage with no document yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with raw document bytes
    pub fn with_document(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Mutex::new(Some(bytes.into())),
            saves: Mutex::new(0),
        }
    }

    /// Current raw document, if anything has been stored
    pub fn document(&self) -> Option<Vec<u8>> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> PersistenceResult<GraphSnapshot> {
        match self.document() {
            Some(bytes) => codec::decode(&bytes),
            None => Ok(GraphSnapshot::empty()),
        }
    }

    fn save(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()> {
        let bytes = codec::encode(snapshot)?;
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes);
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
