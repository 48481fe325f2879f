// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the pipeline graph.

use crate::port::{parse_port_list, PortDirection, PortKind, PortType, WorkflowPort};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node type of the workflow boundary input node
pub const WORKFLOW_INPUT: &str = "WorkflowInput";
/// Node type of the workflow boundary output node
pub const WORKFLOW_OUTPUT: &str = "WorkflowOutput";
/// Node type of the sub-workflow reference node
pub const SUB_WORKFLOW: &str = "Workflow";
/// Node type of the variadic string template node
pub const STRING_TEMPLATE: &str = "StringTemplate";

/// Param holding a boundary node's JSON-encoded port list
pub const PORTS_PARAM: &str = "ports";
/// Param holding a sub-workflow node's cached input interface
pub const INTERFACE_INPUTS_PARAM: &str = "interface_inputs";
/// Param holding a sub-workflow node's cached output interface
pub const INTERFACE_OUTPUTS_PARAM: &str = "interface_outputs";
/// Param holding the string template's input count
pub const NUM_INPUT_PARAM: &str = "num_input";

/// Params stored as JSON-encoded strings that carry structured data on the wire
pub const STRUCTURED_PARAMS: [&str; 3] =
    [PORTS_PARAM, INTERFACE_INPUTS_PARAM, INTERFACE_OUTPUTS_PARAM];

/// Whether a param key holds a JSON-encoded structured value
pub fn is_structured_param(key: &str) -> bool {
    STRUCTURED_PARAMS.contains(&key)
}

/// Unique identifier for a node, assigned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node ID from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Scalar param value.
///
/// Structured values (dynamic port lists, cached interfaces) are stored as
/// JSON-encoded strings so the param map stays flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean
    Bool(bool),
    /// Integer or floating point number
    Number(serde_json::Number),
    /// String
    String(String),
}

impl ParamValue {
    /// Convert a wire value, JSON-encoding anything that is not a scalar
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            other => Self::String(other.to_string()),
        }
    }

    /// Convert to a wire value without decoding strings
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// String contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, accepting numeric strings as typed into a text field
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Self::String(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map_or_else(|| Self::String(value.to_string()), Self::Number)
    }
}

/// Flat param map of a node, in insertion order
pub type Params = IndexMap<String, ParamValue>;

/// Top-left anchored position in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Position {
    /// Create a new position
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Node kinds the graph model treats specially.
///
/// Everything else is resolved through the descriptor catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Workflow boundary input; its `ports` are outputs
    WorkflowInput,
    /// Workflow boundary output; its `ports` are inputs
    WorkflowOutput,
    /// Reference to another workflow with a cached interface
    SubWorkflow,
    /// String template with `num_input` generated inputs
    StringTemplate,
    /// Any other node type
    Generic,
}

impl NodeKind {
    /// Classify a node type name
    pub fn of(node_type: &str) -> Self {
        match node_type {
            WORKFLOW_INPUT => Self::WorkflowInput,
            WORKFLOW_OUTPUT => Self::WorkflowOutput,
            SUB_WORKFLOW => Self::SubWorkflow,
            STRING_TEMPLATE => Self::StringTemplate,
            _ => Self::Generic,
        }
    }

    /// Whether this is a workflow boundary node
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::WorkflowInput | Self::WorkflowOutput)
    }

    /// Which side a boundary node's `ports` appear on
    pub fn boundary_side(&self) -> Option<PortDirection> {
        match self {
            Self::WorkflowInput => Some(PortDirection::Output),
            Self::WorkflowOutput => Some(PortDirection::Input),
            _ => None,
        }
    }

    /// Whether the node's port set depends on its params
    pub fn has_dynamic_ports(&self) -> bool {
        !matches!(self, Self::Generic)
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type name, resolved against the catalog
    pub node_type: String,
    /// Param values
    #[serde(default)]
    pub params: Params,
    /// Position in the graph UI
    #[serde(default)]
    pub position: Position,
}

impl Node {
    /// Create a node with no params
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            params: Params::new(),
            position: Position::default(),
        }
    }

    /// Set a param value
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// The special-cased kind of this node
    pub fn kind(&self) -> NodeKind {
        NodeKind::of(&self.node_type)
    }

    /// Get a param value
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Decode a JSON-encoded port list param; missing or malformed is empty
    pub fn port_list(&self, key: &str) -> Vec<WorkflowPort> {
        match self.params.get(key) {
            Some(ParamValue::String(raw)) => parse_port_list(raw),
            _ => Vec::new(),
        }
    }

    /// The boundary node's dynamic ports
    pub fn dynamic_ports(&self) -> Vec<WorkflowPort> {
        self.port_list(PORTS_PARAM)
    }
}

/// A port as declared by the node descriptor catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Port name
    pub name: String,
    /// Declared type
    pub port_type: PortType,
    /// Stream or param
    pub direction: PortKind,
    /// Whether a value must be supplied
    #[serde(default)]
    pub required: bool,
    /// Default value when nothing is connected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Editor widget hint, e.g. "model_selector"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_hint: Option<String>,
    /// Allowed values for enum-like params
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
    /// Sibling param whose value overrides the declared type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_type_param: Option<String>,
}

impl PortDescriptor {
    /// A required stream port
    pub fn stream(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
            direction: PortKind::Stream,
            required: true,
            default_value: None,
            ui_hint: None,
            enum_options: None,
            dynamic_type_param: None,
        }
    }

    /// A required param port
    pub fn param(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            direction: PortKind::Param,
            ..Self::stream(name, port_type)
        }
    }

    /// An optional param port with a default value
    pub fn optional(
        name: impl Into<String>,
        port_type: PortType,
        default: serde_json::Value,
    ) -> Self {
        Self {
            required: false,
            default_value: Some(default),
            ..Self::param(name, port_type)
        }
    }

    /// Restrict values to a fixed set
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.enum_options = Some(options.iter().map(|o| (*o).to_string()).collect());
        self
    }

    /// Set the editor widget hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.ui_hint = Some(hint.into());
        self
    }

    /// Take the effective type from a sibling param's value
    pub fn with_dynamic_type(mut self, param: impl Into<String>) -> Self {
        self.dynamic_type_param = Some(param.into());
        self
    }
}

/// Node type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Unique type identifier
    pub node_type: String,
    /// Display name
    pub display_name: String,
    /// Category, e.g. "input", "processing", "utility"
    pub category: String,
    /// Hex accent color
    #[serde(default)]
    pub accent_color: String,
    /// Icon name
    #[serde(default)]
    pub icon: String,
    /// Input ports, in display order
    #[serde(default)]
    pub inputs: Vec<PortDescriptor>,
    /// Output ports, in display order
    #[serde(default)]
    pub outputs: Vec<PortDescriptor>,
}

impl NodeDescriptor {
    /// Ports on one side
    pub fn ports(&self, direction: PortDirection) -> &[PortDescriptor] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    /// Find a port by name on one side
    pub fn port(&self, name: &str, direction: PortDirection) -> Option<&PortDescriptor> {
        self.ports(direction).iter().find(|p| p.name == name)
    }
}

/// Read-only registry of node descriptors keyed by node type
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    types: IndexMap<String, NodeDescriptor>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = NodeDescriptor>) -> Self {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.register(descriptor);
        }
        catalog
    }

    /// Parse a JSON array of descriptors
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        let descriptors: Vec<NodeDescriptor> = serde_json::from_str(raw)?;
        Ok(Self::from_descriptors(descriptors))
    }

    /// Register a node type
    pub fn register(&mut self, descriptor: NodeDescriptor) {
        self.types.insert(descriptor.node_type.clone(), descriptor);
    }

    /// Get a descriptor by node type
    pub fn get(&self, node_type: &str) -> Option<&NodeDescriptor> {
        self.types.get(node_type)
    }

    /// All registered descriptors
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.types.values()
    }

    /// Descriptors in one category
    pub fn in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a NodeDescriptor> {
        self.types.values().filter(move |d| d.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node of the given type with scalar param defaults filled in
    pub fn create_node(&self, node_type: &str, id: impl Into<NodeId>) -> Option<Node> {
        let descriptor = self.get(node_type)?;
        let mut node = Node::new(id, node_type);
        for port in descriptor.inputs.iter().filter(|p| p.direction == PortKind::Param) {
            let Some(default) = &port.default_value else {
                continue;
            };
            node.params.insert(port.name.clone(), ParamValue::from_json(default.clone()));
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_kind_classification() {
        assert_eq!(NodeKind::of("WorkflowInput"), NodeKind::WorkflowInput);
        assert_eq!(NodeKind::of("WorkflowOutput"), NodeKind::WorkflowOutput);
        assert_eq!(NodeKind::of("Workflow"), NodeKind::SubWorkflow);
        assert_eq!(NodeKind::of("StringTemplate"), NodeKind::StringTemplate);
        assert_eq!(NodeKind::of("Resize"), NodeKind::Generic);
        assert!(NodeKind::WorkflowOutput.is_boundary());
        assert!(!NodeKind::SubWorkflow.is_boundary());
    }

    #[test]
    fn test_param_value_from_json() {
        assert_eq!(ParamValue::from_json(json!(4)), ParamValue::from(4));
        assert_eq!(ParamValue::from_json(json!("x")), ParamValue::from("x"));
        assert_eq!(ParamValue::from_json(json!(true)), ParamValue::from(true));
        assert_eq!(
            ParamValue::from_json(json!([{ "name": "a" }])),
            ParamValue::from(r#"[{"name":"a"}]"#)
        );
        assert_eq!(ParamValue::from_json(json!(null)), ParamValue::from("null"));
    }

    #[test]
    fn test_param_value_as_i64() {
        assert_eq!(ParamValue::from(3).as_i64(), Some(3));
        assert_eq!(ParamValue::from(" 2 ").as_i64(), Some(2));
        assert_eq!(ParamValue::from("two").as_i64(), None);
        assert_eq!(ParamValue::from(false).as_i64(), None);
    }

    #[test]
    fn test_dynamic_ports_malformed() {
        let node = Node::new("in", WORKFLOW_INPUT).with_param(PORTS_PARAM, "[not json");
        assert!(node.dynamic_ports().is_empty());
    }

    #[test]
    fn test_create_node_fills_defaults() {
        let mut catalog = NodeCatalog::new();
        catalog.register(NodeDescriptor {
            node_type: "Resize".to_string(),
            display_name: "Resize".to_string(),
            category: "processing".to_string(),
            accent_color: String::new(),
            icon: String::new(),
            inputs: vec![
                PortDescriptor::stream("frames", PortType::VideoFrames),
                PortDescriptor::param("width", PortType::Int),
                PortDescriptor::optional("algorithm", PortType::Str, json!("bilinear")),
            ],
            outputs: vec![PortDescriptor::stream("frames", PortType::VideoFrames)],
        });

        let node = catalog.create_node("Resize", "r1").unwrap();
        assert_eq!(node.params.len(), 1);
        assert_eq!(node.param("algorithm"), Some(&ParamValue::from("bilinear")));
        assert!(catalog.create_node("Missing", "m1").is_none());
    }
}
