//! Point-in-time projection of the whole graph
//!
//! The snapshot is the only unit exchanged with storage and the only unit
//! returned to callers that want the whole graph.

use super::edge::Edge;
use super::node::Node;
use super::types::NodeId;
use serde::{Deserialize, Serialize};

/// All nodes and edges at one instant, in store iteration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// The canonical empty graph `{nodes: [], edges: []}`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }
}
