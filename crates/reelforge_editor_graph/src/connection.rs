// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::port::{PortDirection, PortType};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create an edge ID from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random edge ID
    pub fn generate() -> Self {
        Self(format!("edge-{}", Uuid::new_v4()))
    }

    /// Deterministic ID for a connection loaded from a workflow document
    pub fn for_connection(
        from_node: &NodeId,
        from_port: &str,
        to_node: &NodeId,
        to_port: &str,
    ) -> Self {
        Self(format!("{from_node}.{from_port}->{to_node}.{to_port}"))
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A directed binding from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Output port name on the source
    pub source_handle: String,
    /// Target node ID
    pub target: NodeId,
    /// Input port name on the target
    pub target_handle: String,
    /// Cached type, used only when live resolution fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<PortType>,
}

impl Edge {
    /// Create a new edge with a random ID
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: impl Into<String>,
        target: impl Into<NodeId>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: EdgeId::generate(),
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
            port_type: None,
        }
    }

    /// Replace the ID
    pub fn with_id(mut self, id: impl Into<EdgeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the cached type hint
    pub fn with_port_type(mut self, port_type: PortType) -> Self {
        self.port_type = Some(port_type);
        self
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.source == *node_id || self.target == *node_id
    }

    /// The port names this edge uses on `node_id`, from that node's point of view
    pub fn handle_on(&self, node_id: &NodeId) -> Vec<(PortDirection, &str)> {
        let mut handles = Vec::with_capacity(2);
        if self.source == *node_id {
            handles.push((PortDirection::Output, self.source_handle.as_str()));
        }
        if self.target == *node_id {
            handles.push((PortDirection::Input, self.target_handle.as_str()));
        }
        handles
    }
}
