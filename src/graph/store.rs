//! In-memory graph storage implementation
//!
//! The store is the authoritative copy of the graph. It enforces the two
//! structural invariants: node identifiers are unique, and every edge joins
//! two nodes that are present.

use super::allocator::IdAllocator;
use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::snapshot::GraphSnapshot;
use super::types::{Label, NodeId};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    /// An edge endpoint does not name a node in the graph
    #[error("Invalid edge reference: node {0} does not exist")]
    InvalidReference(NodeId),

    /// Edge weights must be finite numbers
    #[error("Invalid edge weight: {0}")]
    InvalidWeight(f64),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
///
/// Uses insertion-ordered maps so snapshots and property lookups see nodes
/// in creation order:
/// - nodes: NodeId -> Node
/// - edges: (source, target) -> Edge, at most one edge per ordered pair
/// - outgoing: NodeId -> targets of its outgoing edges
/// - incoming: NodeId -> sources of its incoming edges
#[derive(Debug, Default)]
pub struct GraphStore {
    /// Node storage
    nodes: IndexMap<NodeId, Node>,

    /// Edge storage keyed by (source, target)
    edges: IndexMap<(NodeId, NodeId), Edge>,

    /// Outgoing adjacency for each node
    outgoing: HashMap<NodeId, HashSet<NodeId>>,

    /// Incoming adjacency for each node
    incoming: HashMap<NodeId, HashSet<NodeId>>,

    /// Identifier source for new nodes
    allocator: IdAllocator,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with a freshly allocated identifier
    pub fn add_node(&mut self, label: impl Into<Label>, properties: PropertyMap) -> Node {
        let mut id = self.allocator.next();
        while self.nodes.contains_key(&id) {
            id = self.allocator.next();
        }
        let node = Node::new_with_properties(id.clone(), label, properties);
        self.nodes.insert(id, node.clone());
        node
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Replace a node's label and properties wholesale.
    ///
    /// Returns false if the node does not exist.
    pub fn change_node(&mut self, id: &NodeId, label: impl Into<Label>, properties: PropertyMap) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.replace(label.into(), properties);
                true
            }
            None => false,
        }
    }

    /// Delete a node and all its connected edges.
    ///
    /// Returns false if the node does not exist.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        if self.nodes.shift_remove(id).is_none() {
            return false;
        }

        let targets = self.outgoing.remove(id).unwrap_or_default();
        let sources = self.incoming.remove(id).unwrap_or_default();

        for target in targets {
            self.edges.shift_remove(&(id.clone(), target.clone()));
            if let Some(adj) = self.incoming.get_mut(&target) {
                adj.remove(id);
            }
        }
        for source in sources {
            self.edges.shift_remove(&(source.clone(), id.clone()));
            if let Some(adj) = self.outgoing.get_mut(&source) {
                adj.remove(id);
            }
        }

        true
    }

    /// Create an edge between two existing nodes.
    ///
    /// An existing edge for the same (source, target) pair is overwritten in
    /// place: its weight is replaced and its position is kept.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, weight: f64) -> GraphResult<Edge> {
        let edge = Edge::new(source, target, weight);
        self.validate_edge(&edge)?;
        self.link(edge.clone());
        Ok(edge)
    }

    /// Get the edge for an ordered pair
    pub fn get_edge(&self, source: &NodeId, target: &NodeId) -> Option<&Edge> {
        self.edges.get(&(source.clone(), target.clone()))
    }

    /// Check if an edge exists for an ordered pair
    pub fn has_edge(&self, source: &NodeId, target: &NodeId) -> bool {
        self.get_edge(source, target).is_some()
    }

    /// Delete the edge for an ordered pair.
    ///
    /// Returns false if no such edge exists.
    pub fn remove_edge(&mut self, source: &NodeId, target: &NodeId) -> bool {
        if self.edges.shift_remove(&(source.clone(), target.clone())).is_none() {
            return false;
        }

        // Remove from adjacency lists
        if let Some(adj) = self.outgoing.get_mut(source) {
            adj.remove(target);
        }
        if let Some(adj) = self.incoming.get_mut(target) {
            adj.remove(source);
        }

        true
    }

    /// First node, in creation order, whose property `key` equals `value`
    pub fn find_node_by_property(&self, key: &str, value: &PropertyValue) -> Option<&Node> {
        self.nodes
            .values()
            .find(|node| node.get_property(key).is_some_and(|v| v.matches(value)))
    }

    /// Copy of the full current node and edge set
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Last identifier value handed out by the allocator
    pub fn last_allocated_id(&self) -> u64 {
        self.allocator.current()
    }

    // ============================================================
    // Recovery methods - used to rebuild graph from persisted data
    // ============================================================

    /// Advance the identifier allocator past the given identifiers.
    ///
    /// Replay calls this once up front so the allocator position is known
    /// before any node goes in.
    pub fn resync_ids<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        self.allocator.resync(ids);
    }

    /// Insert a recovered node (used during recovery from persistence)
    ///
    /// Unlike add_node(), this preserves the node's existing ID and advances
    /// the allocator past it. Returns false and leaves the store unchanged
    /// if the ID is already taken.
    pub fn insert_recovered_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.allocator.resync([&node.id]);
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Insert a recovered edge (used during recovery from persistence)
    ///
    /// Source and target nodes must already exist.
    pub fn insert_recovered_edge(&mut self, edge: Edge) -> GraphResult<()> {
        self.validate_edge(&edge)?;
        self.link(edge);
        Ok(())
    }

    /// Both endpoints present and a weight that survives serialization
    fn validate_edge(&self, edge: &Edge) -> GraphResult<()> {
        if !self.has_node(&edge.source) {
            return Err(GraphError::InvalidReference(edge.source.clone()));
        }
        if !self.has_node(&edge.target) {
            return Err(GraphError::InvalidReference(edge.target.clone()));
        }
        if !edge.weight.is_finite() {
            return Err(GraphError::InvalidWeight(edge.weight));
        }
        Ok(())
    }

    /// Store an edge whose endpoints have been validated
    fn link(&mut self, edge: Edge) {
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        self.edges.insert(edge.key(), edge);
    }
}
