// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a node a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Whether a port carries the per-frame data path or a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Main per-frame/per-item data path
    Stream,
    /// Configuration value
    Param,
}

/// Data type that can flow through ports.
///
/// The set is closed: a name outside it never resolves to a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Decoded video frames
    VideoFrames,
    /// Container/stream metadata
    Metadata,
    /// Loaded inference model handle
    Model,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    Str,
    /// Boolean value
    Bool,
    /// Filesystem path
    Path,
    /// Path to a sub-workflow file
    WorkflowPath,
}

impl PortType {
    /// All port types, in wire order
    pub const ALL: [PortType; 9] = [
        Self::VideoFrames,
        Self::Metadata,
        Self::Model,
        Self::Int,
        Self::Float,
        Self::Str,
        Self::Bool,
        Self::Path,
        Self::WorkflowPath,
    ];

    /// Wire name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VideoFrames => "VideoFrames",
            Self::Metadata => "Metadata",
            Self::Model => "Model",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Str => "Str",
            Self::Bool => "Bool",
            Self::Path => "Path",
            Self::WorkflowPath => "WorkflowPath",
        }
    }

    /// Parse a wire name, returning `None` for anything outside the closed set
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Whether values of this type travel on the stream path
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::VideoFrames | Self::Metadata)
    }

    /// Whether a workflow interface port may carry this type.
    ///
    /// Interfaces pass values, never streams or loaded models.
    pub fn is_interface_type(&self) -> bool {
        !self.is_stream() && *self != Self::Model
    }

    /// Check if this type can connect to another type.
    ///
    /// There is no implicit coercion.
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        self == other
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a port type name outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown port type: {0}")]
pub struct UnknownPortType(pub String);

impl FromStr for PortType {
    type Err = UnknownPortType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownPortType(s.to_string()))
    }
}

/// A runtime-declared port.
///
/// Used for the interface ports of workflow boundary nodes, the cached
/// interface of sub-workflow nodes, and the `interface` block of a
/// workflow document. The type is kept as its wire name so entries with
/// an unknown type still occupy a slot during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPort {
    /// Port name
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Wire name of the port type
    #[serde(default, deserialize_with = "lenient_string")]
    pub port_type: String,
    /// Default value used when nothing is connected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

impl WorkflowPort {
    /// Create a new port entry
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type: port_type.as_str().to_string(),
            default_value: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// The declared type, if it names one of the closed set
    pub fn resolved_type(&self) -> Option<PortType> {
        PortType::parse(&self.port_type)
    }

    /// The declared type, if a workflow interface may carry it
    pub fn interface_type(&self) -> Option<PortType> {
        self.resolved_type().filter(PortType::is_interface_type)
    }
}

/// Read a string field, treating null and non-string values as blank
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Decode a JSON-encoded list of dynamic ports.
///
/// Malformed input yields an empty list, and entries that are not objects
/// are skipped. Partially typed input is expected while the user edits.
pub fn parse_port_list(raw: &str) -> Vec<WorkflowPort> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!("Ignoring malformed port list: {err}");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<WorkflowPort>(value).ok())
        .collect()
}

/// Encode a list of dynamic ports for storage in a flat param map
pub fn encode_port_list(ports: &[WorkflowPort]) -> String {
    serde_json::to_string(ports).unwrap_or_else(|_| "[]".to_string())
}
