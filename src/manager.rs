//! Graph manager
//!
//! Owns the graph store and its snapshot storage. On open it replays the
//! stored snapshot; after every mutation that changed something it saves a
//! fresh snapshot. Save failures are logged and never reach the caller.

use crate::graph::{
    Edge, GraphResult, GraphSnapshot, GraphStore, Label, Node, NodeId, PropertyMap, PropertyValue,
};
use crate::persistence::SnapshotStorage;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Label given to book nodes
pub const BOOK_LABEL: &str = "book";

/// Property holding a book's external catalog code
pub const CODE_PROPERTY_KEY: &str = "code";

/// A book as returned by catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub author: String,
    pub title: String,
    /// Catalog identifier, used to avoid duplicate book nodes
    pub code: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl BookEntry {
    /// Node properties for this book, `code` first
    pub fn into_properties(self) -> PropertyMap {
        let mut properties = PropertyMap::new();
        properties.insert(CODE_PROPERTY_KEY.to_string(), self.code.into());
        properties.insert("title".to_string(), self.title.into());
        properties.insert("author".to_string(), self.author.into());
        properties.insert("published".to_string(), self.published.into());
        properties.insert("isbn".to_string(), self.isbn.into());
        properties.insert("subjects".to_string(), self.subjects.into());
        properties.insert("description".to_string(), self.description.into());
        properties.insert("cover".to_string(), self.cover.into());
        properties
    }
}

/// Process-wide entry point to the graph
pub struct GraphManager {
    /// The graph, including its identifier allocator
    store: RwLock<GraphStore>,

    /// Where snapshots go
    storage: Box<dyn SnapshotStorage>,

    /// Serializes saves so snapshots reach storage in mutation order
    save_lock: Mutex<()>,
}

impl GraphManager {
    /// Load the stored snapshot and replay it into a fresh store.
    ///
    /// Never fails: unreadable or malformed snapshots are logged and the
    /// manager starts with an empty graph.
    pub fn open(storage: impl SnapshotStorage + 'static) -> Self {
        let storage: Box<dyn SnapshotStorage> = Box::new(storage);
        let location = storage.describe();

        let snapshot = match storage.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Could not load graph snapshot from {}: {}. Starting with an empty graph",
                    location, e
                );
                GraphSnapshot::empty()
            }
        };

        let store = replay(snapshot);
        info!(
            "Graph loaded from {}: {} nodes, {} edges, next id after {}",
            location,
            store.node_count(),
            store.edge_count(),
            store.last_allocated_id()
        );

        Self {
            store: RwLock::new(store),
            storage,
            save_lock: Mutex::new(()),
        }
    }

    /// Full graph at one point in time
    pub fn show_graph(&self) -> GraphSnapshot {
        let snapshot = self.read_store().snapshot();
        debug!(
            "Graph snapshot: {} nodes, {} edges",
            snapshot.nodes.len(),
            snapshot.edges.len()
        );
        snapshot
    }

    pub fn find_node_by_property(&self, key: &str, value: &PropertyValue) -> Option<Node> {
        self.read_store().find_node_by_property(key, value).cloned()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<Node> {
        self.read_store().get_node(id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.read_store().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.read_store().edge_count()
    }

    pub fn add_node(&self, label: impl Into<Label>, properties: PropertyMap) -> Node {
        let label = label.into();
        let node = self.mutate(|store| (store.add_node(label, properties), true));
        info!("Node {} added with label {}", node.id, node.label);
        node
    }

    pub fn remove_node(&self, id: &NodeId) -> bool {
        let removed = self.mutate(|store| {
            let removed = store.remove_node(id);
            (removed, removed)
        });
        if removed {
            info!("Node {} removed", id);
        }
        removed
    }

    pub fn change_node(&self, id: &NodeId, label: impl Into<Label>, properties: PropertyMap) -> bool {
        let label = label.into();
        let changed = self.mutate(|store| {
            let changed = store.change_node(id, label, properties);
            (changed, changed)
        });
        if changed {
            info!("Node {} changed", id);
        }
        changed
    }

    pub fn add_edge(&self, source: NodeId, target: NodeId, weight: f64) -> GraphResult<Edge> {
        let result = self.mutate(|store| {
            let result = store.add_edge(source, target, weight);
            let added = result.is_ok();
            (result, added)
        });
        if let Ok(edge) = &result {
            info!("Edge {} -> {} added with weight {}", edge.source, edge.target, edge.weight);
        }
        result
    }

    pub fn remove_edge(&self, source: &NodeId, target: &NodeId) -> bool {
        let removed = self.mutate(|store| {
            let removed = store.remove_edge(source, target);
            (removed, removed)
        });
        if removed {
            info!("Edge {} -> {} removed", source, target);
        }
        removed
    }

    /// Add a book node unless one with the same catalog code exists.
    ///
    /// Returns the existing node unchanged, or the new one.
    pub fn add_book(&self, book: BookEntry) -> Node {
        let code = PropertyValue::from(book.code.as_str());
        self.mutate(|store| {
            if let Some(existing) = store.find_node_by_property(CODE_PROPERTY_KEY, &code) {
                debug!("Book {} already present as node {}", code, existing.id);
                return (existing.clone(), false);
            }
            let node = store.add_node(BOOK_LABEL, book.into_properties());
            info!("Book {} added as node {}", code, node.id);
            (node, true)
        })
    }

    /// Run `op` under the write lock and, if it reports a change, save a
    /// snapshot taken before the lock is released.
    fn mutate<T>(&self, op: impl FnOnce(&mut GraphStore) -> (T, bool)) -> T {
        let mut store = self.write_store();
        let (result, changed) = op(&mut store);
        if !changed {
            return result;
        }

        let snapshot = store.snapshot();
        // Taken before releasing the graph so saves keep mutation order
        let _save_guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        drop(store);

        self.persist(&snapshot);
        result
    }

    fn persist(&self, snapshot: &GraphSnapshot) {
        if let Err(e) = self.storage.save(snapshot) {
            error!(
                "Failed to save graph snapshot to {}: {}",
                self.storage.describe(),
                e
            );
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, GraphStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rebuild a store from a snapshot.
///
/// The allocator is advanced past every recovered id before any node goes
/// in. Duplicate node ids keep the first occurrence; edges with a missing
/// endpoint are dropped.
fn replay(snapshot: GraphSnapshot) -> GraphStore {
    let mut store = GraphStore::new();
    store.resync_ids(snapshot.node_ids());

    let GraphSnapshot { nodes, edges } = snapshot;

    for node in nodes {
        let id = node.id.clone();
        if !store.insert_recovered_node(node) {
            warn!("Skipping duplicate node {} in snapshot", id);
        }
    }

    for edge in edges {
        let (source, target) = edge.key();
        if let Err(e) = store.insert_recovered_edge(edge) {
            warn!("Dropping edge {} -> {} from snapshot: {}", source, target, e);
        }
    }

    store
}
