// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effective port type resolution.
//!
//! A port's type is not always fixed by the catalog. Boundary nodes and
//! sub-workflow nodes declare ports through JSON-encoded params, the string
//! template derives its inputs from `num_input`, and some catalog ports
//! take their type from the *value* of a sibling param (e.g. the output of
//! a type conversion node follows its `output_type` param).
//!
//! Resolution order, first match wins:
//! 1. boundary node `ports`
//! 2. sub-workflow `interface_inputs` / `interface_outputs`
//! 3. string template `str0..strN-1` inputs
//! 4. catalog descriptor, honoring `dynamic_type_param`

use crate::node::{
    Node, NodeCatalog, NodeKind, INTERFACE_INPUTS_PARAM, INTERFACE_OUTPUTS_PARAM, NUM_INPUT_PARAM,
};
use crate::port::{PortDirection, PortType};

/// Prefix of the string template's generated inputs
pub const TEMPLATE_INPUT_PREFIX: &str = "str";

/// A port as currently present on a node instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPort {
    /// Port name
    pub name: String,
    /// Effective type, if it names one of the closed set
    pub port_type: Option<PortType>,
}

/// Resolves effective port types against a descriptor catalog
#[derive(Debug, Clone, Copy)]
pub struct PortResolver<'a> {
    catalog: &'a NodeCatalog,
}

impl<'a> PortResolver<'a> {
    /// Create a resolver over a catalog
    pub fn new(catalog: &'a NodeCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog static ports come from
    pub fn catalog(&self) -> &'a NodeCatalog {
        self.catalog
    }

    /// Effective type of a named port, or `None` if it cannot be resolved
    pub fn resolve(&self, node: &Node, port: &str, direction: PortDirection) -> Option<PortType> {
        self.resolve_dynamic(node, port, direction)
            .or_else(|| self.resolve_static(node, port, direction))
    }

    /// Whether an output port and an input port may be connected
    pub fn can_connect(
        &self,
        source: &Node,
        source_handle: &str,
        target: &Node,
        target_handle: &str,
    ) -> bool {
        self.connection_type(source, source_handle, target, target_handle)
            .is_some()
    }

    /// The shared type of a valid connection
    pub fn connection_type(
        &self,
        source: &Node,
        source_handle: &str,
        target: &Node,
        target_handle: &str,
    ) -> Option<PortType> {
        let from = self.resolve(source, source_handle, PortDirection::Output)?;
        let to = self.resolve(target, target_handle, PortDirection::Input)?;
        from.can_connect_to(&to).then_some(from)
    }

    /// All ports currently present on one side of a node
    pub fn ports(&self, node: &Node, direction: PortDirection) -> Vec<ResolvedPort> {
        let mut ports = self.dynamic_ports(node, direction);

        if let Some(descriptor) = self.catalog.get(&node.node_type) {
            for port in descriptor.ports(direction) {
                if ports.iter().any(|p| p.name == port.name) {
                    continue;
                }
                ports.push(ResolvedPort {
                    name: port.name.clone(),
                    port_type: self.resolve_static(node, &port.name, direction),
                });
            }
        }

        ports
    }

    /// Whether a port with this name exists, regardless of its type
    pub fn has_port(&self, node: &Node, port: &str, direction: PortDirection) -> bool {
        let dynamic = match node.kind() {
            NodeKind::StringTemplate => is_template_input(node, port, direction),
            NodeKind::Generic => false,
            _ => self
                .dynamic_ports(node, direction)
                .iter()
                .any(|p| p.name == port),
        };
        dynamic
            || self
                .catalog
                .get(&node.node_type)
                .is_some_and(|d| d.port(port, direction).is_some())
    }

    /// Number of ports on one side of a node, as [`Self::ports`] would list
    pub fn port_count(&self, node: &Node, direction: PortDirection) -> usize {
        if node.kind() != NodeKind::StringTemplate {
            return self.ports(node, direction).len();
        }

        let generated = match direction {
            PortDirection::Input => {
                usize::try_from(template_input_count(node)).unwrap_or(usize::MAX)
            }
            PortDirection::Output => 0,
        };
        let declared = self.catalog.get(&node.node_type).map_or(0, |d| {
            d.ports(direction)
                .iter()
                .filter(|p| !is_template_input(node, &p.name, direction))
                .count()
        });
        generated.saturating_add(declared)
    }

    fn resolve_dynamic(
        &self,
        node: &Node,
        port: &str,
        direction: PortDirection,
    ) -> Option<PortType> {
        match node.kind() {
            NodeKind::StringTemplate => {
                is_template_input(node, port, direction).then_some(PortType::Str)
            }
            NodeKind::Generic => None,
            _ => self
                .dynamic_ports(node, direction)
                .into_iter()
                .find(|p| p.name == port)
                .and_then(|p| p.port_type),
        }
    }

    fn dynamic_ports(&self, node: &Node, direction: PortDirection) -> Vec<ResolvedPort> {
        let declared = match node.kind() {
            NodeKind::WorkflowInput | NodeKind::WorkflowOutput => {
                if node.kind().boundary_side() != Some(direction) {
                    return Vec::new();
                }
                node.dynamic_ports()
            }
            NodeKind::SubWorkflow => match direction {
                PortDirection::Input => node.port_list(INTERFACE_INPUTS_PARAM),
                PortDirection::Output => node.port_list(INTERFACE_OUTPUTS_PARAM),
            },
            NodeKind::StringTemplate => {
                if direction != PortDirection::Input {
                    return Vec::new();
                }
                return (0..template_input_count(node))
                    .map(|index| ResolvedPort {
                        name: format!("{TEMPLATE_INPUT_PREFIX}{index}"),
                        port_type: Some(PortType::Str),
                    })
                    .collect();
            }
            NodeKind::Generic => return Vec::new(),
        };

        declared
            .into_iter()
            .map(|p| ResolvedPort {
                port_type: p.interface_type(),
                name: p.name,
            })
            .collect()
    }

    fn resolve_static(
        &self,
        node: &Node,
        port: &str,
        direction: PortDirection,
    ) -> Option<PortType> {
        let descriptor = self.catalog.get(&node.node_type)?;
        let port = descriptor.port(port, direction)?;

        let overridden = port
            .dynamic_type_param
            .as_deref()
            .and_then(|param| node.param(param))
            .and_then(|value| value.as_str())
            .and_then(PortType::parse);

        Some(overridden.unwrap_or(port.port_type))
    }
}

/// Number of generated string template inputs; negative or missing is zero
fn template_input_count(node: &Node) -> i64 {
    node.param(NUM_INPUT_PARAM)
        .and_then(|value| value.as_i64())
        .unwrap_or(0)
        .max(0)
}

/// Whether `port` is one of the template's generated `strN` inputs
fn is_template_input(node: &Node, port: &str, direction: PortDirection) -> bool {
    if direction != PortDirection::Input {
        return false;
    }
    let Some(index) = port
        .strip_prefix(TEMPLATE_INPUT_PREFIX)
        .and_then(|digits| digits.parse::<i64>().ok())
    else {
        return false;
    };
    index >= 0
        && index < template_input_count(node)
        && port == format!("{TEMPLATE_INPUT_PREFIX}{index}")
}
