// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic left-to-right auto-layout.
//!
//! A layered (Sugiyama-style) layout:
//!   1. Cycle breaking (greedy feedback arc set)
//!   2. Rank assignment (longest path, sources pulled toward their targets)
//!   3. Ordering within ranks (barycenter sweeps)
//!   4. Coordinate assignment
//!
//! Node heights grow with port count so ports never overlap. Coordinates
//! are computed center-anchored and returned top-left anchored.

use crate::connection::Edge;
use crate::node::{Node, NodeId, Position};
use crate::port::PortDirection;
use crate::resolve::PortResolver;
use indexmap::IndexMap;
use petgraph::algo::{greedy_feedback_arc_set, toposort};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Number of down/up barycenter sweep pairs
const ORDERING_SWEEPS: usize = 4;

/// Node sizing and spacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of every node
    pub node_width: f32,
    /// Height of the node title bar
    pub title_height: f32,
    /// Height of one port row
    pub row_height: f32,
    /// Minimum vertical gap between nodes in the same rank
    pub node_separation: f32,
    /// Minimum horizontal gap between ranks
    pub rank_separation: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            title_height: 44.0,
            row_height: 28.0,
            node_separation: 40.0,
            rank_separation: 80.0,
        }
    }
}

impl LayoutConfig {
    /// Size of a node: fixed width, height from its busiest side
    pub fn node_size(&self, resolver: &PortResolver<'_>, node: &Node) -> (f32, f32) {
        let inputs = resolver.port_count(node, PortDirection::Input);
        let outputs = resolver.port_count(node, PortDirection::Output);
        let rows = inputs.max(outputs) as f32;
        (self.node_width, self.title_height + rows * self.row_height)
    }
}

/// Compute top-left positions for every node.
///
/// Edges whose endpoints are not among `nodes` are ignored. The result
/// depends only on node order and edges, never on current positions.
pub fn compute_layout<'a>(
    resolver: &PortResolver<'_>,
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
    config: &LayoutConfig,
) -> IndexMap<NodeId, Position> {
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let sizes: Vec<(f32, f32)> = nodes.iter().map(|n| config.node_size(resolver, n)).collect();

    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(nodes.len(), 0);
    let mut index_of: HashMap<&NodeId, NodeIndex> = HashMap::with_capacity(nodes.len());
    for node in &nodes {
        index_of.insert(&node.id, graph.add_node(()));
    }
    for edge in edges {
        let (Some(&from), Some(&to)) = (index_of.get(&edge.source), index_of.get(&edge.target))
        else {
            continue;
        };
        if from != to {
            graph.add_edge(from, to, ());
        }
    }

    let acyclic = break_cycles(&graph);
    let ranks = assign_ranks(&acyclic);
    let layers = order_layers(&acyclic, &ranks);
    let centers = assign_coordinates(&layers, &sizes, config);

    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let (width, height) = sizes[i];
            let (cx, cy) = centers[i];
            (node.id.clone(), Position::new(cx - width / 2.0, cy - height / 2.0))
        })
        .collect()
}

fn break_cycles(graph: &DiGraph<(), ()>) -> DiGraph<(), ()> {
    let back_edges: HashSet<EdgeIndex> = greedy_feedback_arc_set(graph).map(|e| e.id()).collect();
    if back_edges.is_empty() {
        return graph.clone();
    }

    let mut acyclic = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    for _ in graph.node_indices() {
        acyclic.add_node(());
    }
    for edge in graph.edge_references() {
        if back_edges.contains(&edge.id()) {
            acyclic.add_edge(edge.target(), edge.source(), ());
        } else {
            acyclic.add_edge(edge.source(), edge.target(), ());
        }
    }
    acyclic
}

fn assign_ranks(graph: &DiGraph<(), ()>) -> Vec<usize> {
    let order = toposort(graph, None).unwrap_or_else(|_| graph.node_indices().collect());
    let mut ranks = vec![0usize; graph.node_count()];

    for &node in &order {
        for pred in graph.neighbors_directed(node, Direction::Incoming) {
            ranks[node.index()] = ranks[node.index()].max(ranks[pred.index()] + 1);
        }
    }

    // Sources sit just before their nearest target instead of at rank 0.
    for &node in order.iter().rev() {
        if graph.neighbors_directed(node, Direction::Incoming).next().is_some() {
            continue;
        }
        let nearest = graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|succ| ranks[succ.index()])
            .min();
        if let Some(rank) = nearest {
            ranks[node.index()] = rank.saturating_sub(1);
        }
    }

    ranks
}

fn order_layers(graph: &DiGraph<(), ()>, ranks: &[usize]) -> Vec<Vec<NodeIndex>> {
    let layer_count = ranks.iter().max().map_or(0, |max| max + 1);
    let mut layers: Vec<Vec<NodeIndex>> = vec![Vec::new(); layer_count];
    for node in graph.node_indices() {
        layers[ranks[node.index()]].push(node);
    }

    let mut slot = vec![0f32; graph.node_count()];
    let reindex = |layer: &[NodeIndex], slot: &mut [f32]| {
        for (i, node) in layer.iter().enumerate() {
            slot[node.index()] = i as f32;
        }
    };
    for layer in &layers {
        reindex(layer, &mut slot);
    }

    for _ in 0..ORDERING_SWEEPS {
        for rank in 1..layer_count {
            sort_by_barycenter(graph, &mut layers[rank], &slot, Direction::Incoming);
            reindex(&layers[rank], &mut slot);
        }
        for rank in (0..layer_count.saturating_sub(1)).rev() {
            sort_by_barycenter(graph, &mut layers[rank], &slot, Direction::Outgoing);
            reindex(&layers[rank], &mut slot);
        }
    }

    layers
}

fn sort_by_barycenter(
    graph: &DiGraph<(), ()>,
    layer: &mut [NodeIndex],
    slot: &[f32],
    direction: Direction,
) {
    let keys: HashMap<NodeIndex, f32> = layer
        .iter()
        .map(|&node| {
            let (sum, count) = graph
                .neighbors_directed(node, direction)
                .fold((0.0f32, 0usize), |(sum, count), n| (sum + slot[n.index()], count + 1));
            let key = if count == 0 {
                slot[node.index()]
            } else {
                sum / count as f32
            };
            (node, key)
        })
        .collect();

    // Stable sort: ties keep their previous relative order.
    layer.sort_by(|a, b| keys[a].total_cmp(&keys[b]));
}

fn assign_coordinates(
    layers: &[Vec<NodeIndex>],
    sizes: &[(f32, f32)],
    config: &LayoutConfig,
) -> Vec<(f32, f32)> {
    let layer_height = |layer: &[NodeIndex]| -> f32 {
        let nodes: f32 = layer.iter().map(|n| sizes[n.index()].1).sum();
        nodes + layer.len().saturating_sub(1) as f32 * config.node_separation
    };
    let tallest = layers.iter().map(|l| layer_height(l)).fold(0.0f32, f32::max);

    let mut centers = vec![(0.0, 0.0); sizes.len()];
    let mut x = 0.0f32;
    for layer in layers {
        let width = layer
            .iter()
            .map(|n| sizes[n.index()].0)
            .fold(0.0f32, f32::max);

        let mut y = (tallest - layer_height(layer)) / 2.0;
        for node in layer {
            let height = sizes[node.index()].1;
            centers[node.index()] = (x + width / 2.0, y + height / 2.0);
            y += height + config.node_separation;
        }

        x += width + config.rank_separation;
    }

    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::node::NUM_INPUT_PARAM;

    fn chain(ids: &[&str]) -> (Vec<Node>, Vec<Edge>) {
        let nodes: Vec<Node> = ids.iter().map(|id| Node::new(*id, "Resize")).collect();
        let edges = ids
            .windows(2)
            .map(|pair| Edge::new(pair[0], "frames", pair[1], "frames"))
            .collect();
        (nodes, edges)
    }

    fn assert_distinct(positions: &IndexMap<NodeId, Position>) {
        let values: Vec<&Position> = positions.values().collect();
        for (i, a) in values.iter().enumerate() {
            for b in &values[i + 1..] {
                assert!(a != b, "two nodes share {a:?}");
            }
        }
    }

    #[test]
    fn test_chain_flows_left_to_right() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let (nodes, edges) = chain(&["a", "b", "c", "d"]);

        let positions = compute_layout(&resolver, &nodes, &edges, &LayoutConfig::default());
        let xs: Vec<f32> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| positions[&NodeId::from(*id)].x)
            .collect();

        assert!(xs.windows(2).all(|w| w[0] < w[1]), "{xs:?}");
        assert_distinct(&positions);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let (mut nodes, mut edges) = chain(&["a", "b", "c"]);
        nodes.push(Node::new("x", "Constant"));
        nodes.push(Node::new("y", "Print"));
        edges.push(Edge::new("a", "frames", "c", "frames"));
        edges.push(Edge::new("x", "value", "b", "width"));

        let config = LayoutConfig::default();
        let first = compute_layout(&resolver, &nodes, &edges, &config);

        for node in &mut nodes {
            node.position = Position::new(999.0, -5.0);
        }
        let second = compute_layout(&resolver, &nodes, &edges, &config);
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
        assert_distinct(&first);
    }

    #[test]
    fn test_cycle_still_places_every_node() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let (nodes, mut edges) = chain(&["a", "b", "c"]);
        edges.push(Edge::new("c", "frames", "a", "frames"));
        edges.push(Edge::new("b", "frames", "b", "frames"));

        let positions = compute_layout(&resolver, &nodes, &edges, &LayoutConfig::default());
        assert_eq!(positions.len(), 3);
        assert_distinct(&positions);
    }

    #[test]
    fn test_source_pulled_next_to_target() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let (mut nodes, mut edges) = chain(&["a", "b", "c"]);
        nodes.push(Node::new("k", "Constant"));
        edges.push(Edge::new("k", "value", "c", "width"));

        let positions = compute_layout(&resolver, &nodes, &edges, &LayoutConfig::default());
        assert_eq!(positions[&NodeId::from("k")].x, positions[&NodeId::from("b")].x);
        assert!(positions[&NodeId::from("k")].x < positions[&NodeId::from("c")].x);
    }

    #[test]
    fn test_node_height_tracks_port_count() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let config = LayoutConfig::default();

        let small = Node::new("t", "StringTemplate");
        let large = Node::new("t", "StringTemplate").with_param(NUM_INPUT_PARAM, 5);
        let (_, small_h) = config.node_size(&resolver, &small);
        let (width, large_h) = config.node_size(&resolver, &large);

        assert_eq!(width, config.node_width);
        assert_eq!(small_h, config.title_height + 3.0 * config.row_height);
        assert_eq!(large_h, config.title_height + 8.0 * config.row_height);
    }

    #[test]
    fn test_empty_graph() {
        let catalog = builtin_catalog();
        let resolver = PortResolver::new(&catalog);
        let positions = compute_layout(&resolver, &[], &[], &LayoutConfig::default());
        assert!(positions.is_empty());
    }
}
