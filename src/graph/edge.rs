//! Edge implementation for the book graph
//!
//! An edge is identified by its ordered (source, target) pair; the graph
//! holds at most one edge per pair.

use super::types::NodeId;
use serde::{Deserialize, Serialize};

/// Weight given to edges created without an explicit weight
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

fn default_weight() -> f64 {
    DEFAULT_EDGE_WEIGHT
}

/// A directed, weighted edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node (edge goes FROM this node)
    pub source: NodeId,

    /// Target node (edge goes TO this node)
    pub target: NodeId,

    /// Relationship strength
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(source: NodeId, target: NodeId, weight: f64) -> Self {
        Edge { source, target, weight }
    }

    /// The (source, target) pair identifying this edge
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.source.clone(), self.target.clone())
    }
}
