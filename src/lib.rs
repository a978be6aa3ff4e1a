//! Bookloom
//!
//! A personal directed graph of books and the relationships between them,
//! kept in memory and persisted as a single JSON snapshot.
//!
//! # Architecture
//!
//! - `graph`: nodes, edges, the identifier allocator and the in-memory store
//! - `persistence`: snapshot codec and storage backends
//! - `manager`: startup replay and save-after-mutation around the store
//! - `http`: axum routes over the manager
//!
//! ## Example Usage
//!
//! ```rust
//! use bookloom::{GraphManager, MemoryStorage, NodeId, PropertyMap};
//!
//! let manager = GraphManager::open(MemoryStorage::new());
//!
//! let mut properties = PropertyMap::new();
//! properties.insert("title".to_string(), "Solaris".into());
//! let solaris = manager.add_node("book", properties);
//! let fiasco = manager.add_node("book", PropertyMap::new());
//! assert_eq!(solaris.id, NodeId::new("1"));
//!
//! // Edges require both endpoints
//! manager.add_edge(solaris.id.clone(), fiasco.id.clone(), 0.8).unwrap();
//! assert!(manager.add_edge(solaris.id.clone(), NodeId::new("99"), 1.0).is_err());
//!
//! // Removing a node removes its edges
//! assert!(manager.remove_node(&fiasco.id));
//! assert_eq!(manager.show_graph().edges.len(), 0);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod http;
pub mod manager;
pub mod persistence;

// Re-export main types for convenience
pub use graph::{
    Edge, GraphError, GraphResult, GraphSnapshot, GraphStore, IdAllocator, Label, Node, NodeId,
    PropertyMap, PropertyValue,
};

pub use manager::{BookEntry, GraphManager};

pub use persistence::{
    JsonFileStorage, MemoryStorage, PersistenceError, PersistenceResult, SnapshotStorage,
};

pub use http::{ApiError, HttpServer, ServerConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
