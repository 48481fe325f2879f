// SPDX-License-Identifier: MIT OR Apache-2.0
//! Workflow document wire format.
//!
//! Live nodes keep a flat map of scalar params. On the wire, the
//! allow-listed structured params (`ports`, `interface_inputs`,
//! `interface_outputs`) carry real JSON arrays instead of escaped strings.
//! Every other string goes out byte-for-byte, even if it looks like JSON.

use crate::node::{is_structured_param, NodeId, ParamValue, Params};
use crate::port::{PortType, WorkflowPort};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors reading or writing a workflow document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Input is not a valid workflow document
    #[error("Invalid workflow document: {0}")]
    Parse(#[source] serde_json::Error),

    /// Document could not be serialized
    #[error("Failed to serialize workflow document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A node as it appears in a workflow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Node ID
    pub id: NodeId,
    /// Node type name
    pub node_type: String,
    /// Param values, structured params decoded
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// A connection as it appears in a workflow document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConnection {
    /// Source node ID
    pub from_node: NodeId,
    /// Output port on the source
    pub from_port: String,
    /// Target node ID
    pub to_node: NodeId,
    /// Input port on the target
    pub to_port: String,
    /// Resolved type of the connection
    pub port_type: PortType,
}

/// Externally callable interface of a workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInterface {
    /// Ports declared by workflow input nodes
    #[serde(default)]
    pub inputs: Vec<WorkflowPort>,
    /// Ports declared by workflow output nodes
    #[serde(default)]
    pub outputs: Vec<WorkflowPort>,
}

/// Serialization unit exchanged with the execution backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// Nodes, in graph order
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Connections, in graph order
    #[serde(default)]
    pub connections: Vec<WorkflowConnection>,
    /// Present when the graph has boundary nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<WorkflowInterface>,
}

impl WorkflowDocument {
    /// Parse a document, accepting a `{ "workflow": { ... } }` preset envelope
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(DocumentError::Parse)?;
        Self::from_value(value)
    }

    /// Convert a parsed JSON value, unwrapping a preset envelope if present
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(unwrap_envelope(value)).map_err(DocumentError::Parse)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Serialize)
    }
}

fn unwrap_envelope(value: Value) -> Value {
    if value.get("nodes").is_some() {
        return value;
    }
    match value.get("workflow") {
        Some(inner) if inner.get("nodes").is_some() => inner.clone(),
        _ => value,
    }
}

/// Convert live params to wire params
pub fn export_params(params: &Params) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), export_param(key, value)))
        .collect()
}

fn export_param(key: &str, value: &ParamValue) -> Value {
    match value {
        ParamValue::String(raw) if is_structured_param(key) => match serde_json::from_str(raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!("Param '{key}' holds malformed JSON, exporting it verbatim: {err}");
                value.to_json()
            }
        },
        _ => value.to_json(),
    }
}

/// Convert wire params to live params, JSON-encoding non-scalars
pub fn import_params(params: Map<String, Value>) -> Params {
    params
        .into_iter()
        .map(|(key, value)| (key, ParamValue::from_json(value)))
        .collect()
}
