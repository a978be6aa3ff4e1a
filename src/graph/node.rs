//! Node implementation for the book graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};

/// A node in the graph
///
/// Nodes have:
/// - A unique ID assigned by the store
/// - A single free-text label
/// - Properties (key-value pairs), replaced wholesale on change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Category of this node (e.g. "book")
    pub label: Label,

    /// Properties associated with this node
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node without properties
    pub fn new(id: NodeId, label: impl Into<Label>) -> Self {
        Node {
            id,
            label: label.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Create a new node with properties
    pub fn new_with_properties(id: NodeId, label: impl Into<Label>, properties: PropertyMap) -> Self {
        Node {
            id,
            label: label.into(),
            properties,
        }
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Check if property exists
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Replace label and properties, keeping the identifier
    pub(crate) fn replace(&mut self, label: Label, properties: PropertyMap) {
        self.label = label;
        self.properties = properties;
    }
}
