//! Core book graph implementation
//!
//! This module implements the graph data model:
//! - Nodes with a single label and ordered properties
//! - Directed, weighted edges, at most one per ordered pair
//! - Store-assigned identifiers that are never reused
//! - In-memory storage with adjacency indices for cascading removal

pub mod allocator;
pub mod edge;
pub mod node;
pub mod property;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-export main types
pub use allocator::IdAllocator;
pub use edge::{Edge, DEFAULT_EDGE_WEIGHT};
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use snapshot::GraphSnapshot;
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{Label, NodeId};
