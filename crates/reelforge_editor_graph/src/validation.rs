// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pre-execution checks over a whole graph.
//!
//! Validation never mutates. It reports what the backend would refuse to
//! run: cycles, unsatisfied required inputs, and edges whose ports have
//! drifted since they were connected.

use crate::connection::{Edge, EdgeId};
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortType};
use crate::resolve::PortResolver;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A problem found by [`validate_graph`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// These nodes form a cycle
    Cycle {
        /// Nodes on the cycle, in graph order
        nodes: Vec<NodeId>,
    },
    /// A required input has no connection, param value or default
    MissingInput {
        /// Node with the missing input
        node: NodeId,
        /// Input port name
        port: String,
    },
    /// An edge handle names a port the node does not have
    DanglingHandle {
        /// Offending edge
        edge: EdgeId,
        /// Node the handle belongs to
        node: NodeId,
        /// Port name
        port: String,
        /// Side of the node
        direction: PortDirection,
    },
    /// Both endpoints resolve, to different types
    TypeMismatch {
        /// Offending edge
        edge: EdgeId,
        /// Type of the output port
        source_type: PortType,
        /// Type of the input port
        target_type: PortType,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { nodes } => {
                let names: Vec<&str> = nodes.iter().map(NodeId::as_str).collect();
                write!(f, "cycle through nodes {}", names.join(", "))
            }
            Self::MissingInput { node, port } => {
                write!(f, "node '{node}' is missing required input '{port}'")
            }
            Self::DanglingHandle {
                edge,
                node,
                port,
                direction,
            } => {
                let side = match direction {
                    PortDirection::Input => "input",
                    PortDirection::Output => "output",
                };
                write!(f, "edge {edge}: node '{node}' has no {side} port '{port}'")
            }
            Self::TypeMismatch {
                edge,
                source_type,
                target_type,
            } => write!(f, "edge {edge}: {source_type} cannot feed {target_type}"),
        }
    }
}

/// Check a graph and return every issue found, in a stable order
pub fn validate_graph<'a>(
    resolver: &PortResolver<'_>,
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Vec<ValidationIssue> {
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let edges: Vec<&Edge> = edges.into_iter().collect();
    let by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|n| (&n.id, *n)).collect();

    let mut issues = find_cycles(&nodes, &edges);

    for edge in &edges {
        let (Some(source), Some(target)) = (by_id.get(&edge.source), by_id.get(&edge.target)) else {
            continue;
        };

        let mut dangling = false;
        for (node, port, direction) in [
            (*source, &edge.source_handle, PortDirection::Output),
            (*target, &edge.target_handle, PortDirection::Input),
        ] {
            if !resolver.has_port(node, port, direction) {
                dangling = true;
                issues.push(ValidationIssue::DanglingHandle {
                    edge: edge.id.clone(),
                    node: node.id.clone(),
                    port: port.clone(),
                    direction,
                });
            }
        }
        if dangling {
            continue;
        }

        let source_type = resolver.resolve(source, &edge.source_handle, PortDirection::Output);
        let target_type = resolver.resolve(target, &edge.target_handle, PortDirection::Input);
        if let (Some(source_type), Some(target_type)) = (source_type, target_type) {
            if !source_type.can_connect_to(&target_type) {
                issues.push(ValidationIssue::TypeMismatch {
                    edge: edge.id.clone(),
                    source_type,
                    target_type,
                });
            }
        }
    }

    let connected: HashSet<(&NodeId, &str)> = edges
        .iter()
        .map(|e| (&e.target, e.target_handle.as_str()))
        .collect();

    for node in &nodes {
        let Some(descriptor) = resolver.catalog().get(&node.node_type) else {
            continue;
        };
        for input in &descriptor.inputs {
            let satisfied = !input.required
                || input.default_value.is_some()
                || node.params.contains_key(&input.name)
                || connected.contains(&(&node.id, input.name.as_str()));
            if !satisfied {
                issues.push(ValidationIssue::MissingInput {
                    node: node.id.clone(),
                    port: input.name.clone(),
                });
            }
        }
    }

    issues
}

fn find_cycles(nodes: &[&Node], edges: &[&Edge]) -> Vec<ValidationIssue> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let index_of: HashMap<&NodeId, NodeIndex> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (&n.id, graph.add_node(i)))
        .collect();

    let mut self_loops = HashSet::new();
    for edge in edges {
        let (Some(&from), Some(&to)) = (index_of.get(&edge.source), index_of.get(&edge.target))
        else {
            continue;
        };
        if from == to {
            self_loops.insert(from);
        }
        graph.add_edge(from, to, ());
    }

    let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1 || self_loops.contains(&component[0]))
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(|ix| graph[ix]).collect();
            members.sort_unstable();
            members
        })
        .collect();
    cycles.sort();

    cycles
        .into_iter()
        .map(|members| ValidationIssue::Cycle {
            nodes: members.into_iter().map(|i| nodes[i].id.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;

    fn resize(id: &str) -> Node {
        Node::new(id, "Resize").with_param("width", 1280).with_param("height", 720)
    }

    #[test]
    fn test_valid_chain_has_no_issues() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let nodes = vec![
            Node::new("in", "VideoInput").with_param("path", "in.mkv"),
            resize("r"),
        ];
        let edges = vec![Edge::new("in", "frames", "r", "frames")];

        assert!(validate_graph(&resolver, &nodes, &edges).is_empty());
    }

    #[test]
    fn test_missing_required_input() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let nodes = vec![Node::new("r", "Resize").with_param("width", 1280)];

        let issues = validate_graph(&resolver, &nodes, &[]);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::MissingInput {
                    node: "r".into(),
                    port: "frames".to_string()
                },
                ValidationIssue::MissingInput {
                    node: "r".into(),
                    port: "height".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_cycle_reported_once() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let nodes = vec![resize("a"), resize("b"), resize("c")];
        let edges = vec![
            Edge::new("a", "frames", "b", "frames"),
            Edge::new("b", "frames", "c", "frames"),
            Edge::new("c", "frames", "b", "frames"),
        ];

        let issues = validate_graph(&resolver, &nodes, &edges);
        let cycles: Vec<_> = issues
            .iter()
            .filter(|i| matches!(i, ValidationIssue::Cycle { .. }))
            .collect();
        assert_eq!(
            cycles,
            vec![&ValidationIssue::Cycle {
                nodes: vec!["b".into(), "c".into()]
            }]
        );
    }

    #[test]
    fn test_type_drift_and_dangling_handles() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let nodes = vec![
            Node::new("conv", "TypeConversion").with_param("output_type", "Str"),
            resize("r"),
        ];
        let edges = vec![
            Edge::new("conv", "value", "r", "width").with_id("drift"),
            Edge::new("conv", "gone", "r", "height").with_id("dangling"),
        ];

        let issues = validate_graph(&resolver, &nodes, &edges);
        assert!(issues.contains(&ValidationIssue::TypeMismatch {
            edge: "drift".into(),
            source_type: PortType::Str,
            target_type: PortType::Int,
        }));
        assert!(issues.contains(&ValidationIssue::DanglingHandle {
            edge: "dangling".into(),
            node: "conv".into(),
            port: "gone".to_string(),
            direction: PortDirection::Output,
        }));
        assert!(issues[0].to_string().starts_with("edge drift"));
    }
}
