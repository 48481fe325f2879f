// SPDX-License-Identifier: MIT OR Apache-2.0
//! The authoritative pipeline graph with undo/redo.
//!
//! Every public mutation records the pre-mutation snapshot, clears the
//! redo stack and applies the change in one call. When a call returns,
//! every edge endpoint exists and every edge handle names a port its node
//! currently has.

use crate::connection::{Edge, EdgeId};
use crate::document::{
    export_params, import_params, WorkflowConnection, WorkflowDocument, WorkflowInterface,
    WorkflowNode,
};
use crate::dynamic_ports::{build_rename_map, normalize_ports, remap_edges, RenameMap};
use crate::history::{GraphSnapshot, History, MAX_HISTORY};
use crate::layout::{compute_layout, LayoutConfig};
use crate::node::{Node, NodeCatalog, NodeId, NodeKind, ParamValue, Params, Position, PORTS_PARAM};
use crate::port::{encode_port_list, parse_port_list, PortDirection, PortType};
use crate::resolve::PortResolver;
use crate::validation::{validate_graph, ValidationIssue};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Horizontal spacing of nodes placed without stored positions
const FALLBACK_COLUMN_WIDTH: f32 = 300.0;
/// Vertical offset of nodes placed without stored positions
const FALLBACK_ROW_Y: f32 = 100.0;

/// Error when a structural edit is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with this ID already exists
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// An edge with this ID already exists
    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    /// The same ports are already connected
    #[error(
        "Ports already connected: {source_node}.{source_handle} -> {target_node}.{target_handle}"
    )]
    AlreadyConnected {
        /// Source node
        source_node: NodeId,
        /// Output port on the source
        source_handle: String,
        /// Target node
        target_node: NodeId,
        /// Input port on the target
        target_handle: String,
    },

    /// Port does not exist or its type cannot be resolved
    #[error("Unresolvable {direction:?} port '{port}' on node {node}")]
    UnresolvedPort {
        /// Node carrying the port
        node: NodeId,
        /// Port name
        port: String,
        /// Side of the node
        direction: PortDirection,
    },

    /// Incompatible port types
    #[error("Incompatible port types: {source_type} -> {target_type}")]
    IncompatiblePorts {
        /// Resolved type of the output port
        source_type: PortType,
        /// Resolved type of the input port
        target_type: PortType,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(NodeId),
}

/// Result type for graph edits
pub type Result<T> = std::result::Result<T, GraphError>;

/// Node and edge collections with history and the serialization boundary
#[derive(Debug)]
pub struct GraphStore {
    catalog: Arc<NodeCatalog>,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    history: History,
    current_file: Option<PathBuf>,
}

impl GraphStore {
    /// Create an empty store resolving node types against `catalog`
    pub fn new(catalog: Arc<NodeCatalog>) -> Self {
        Self::with_history_depth(catalog, MAX_HISTORY)
    }

    /// Create with a custom undo depth
    pub fn with_history_depth(catalog: Arc<NodeCatalog>, depth: usize) -> Self {
        Self {
            catalog,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            history: History::with_max_depth(depth),
            current_file: None,
        }
    }

    /// The descriptor catalog
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    /// A port resolver over this store's catalog
    pub fn resolver(&self) -> PortResolver<'_> {
        PortResolver::new(&self.catalog)
    }

    // ----- Queries -----

    /// Get a node by ID
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get an edge by ID
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges touching a node
    pub fn edges_for_node<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.involves_node(id))
    }

    /// Effective type of a node's port
    pub fn resolve_port(
        &self,
        id: &NodeId,
        port: &str,
        direction: PortDirection,
    ) -> Option<PortType> {
        let node = self.nodes.get(id)?;
        self.resolver().resolve(node, port, direction)
    }

    /// Type of an edge: the source port first, then the target port, then
    /// the cached hint
    pub fn edge_type(&self, edge: &Edge) -> Option<PortType> {
        let resolver = self.resolver();
        let from = self
            .nodes
            .get(&edge.source)
            .and_then(|n| resolver.resolve(n, &edge.source_handle, PortDirection::Output));
        let to = || {
            self.nodes
                .get(&edge.target)
                .and_then(|n| resolver.resolve(n, &edge.target_handle, PortDirection::Input))
        };
        from.or_else(to).or(edge.port_type)
    }

    /// Deep copy of the current node and edge collections
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Report problems that would stop the workflow from running
    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_graph(&self.resolver(), self.nodes.values(), self.edges.values())
    }

    // ----- Current file -----

    /// The file this graph was last saved to or opened from
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Bind the graph to a file
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    // ----- History -----

    fn checkpoint(&mut self, description: &str) {
        let before = self.snapshot();
        self.history.record(description, before);
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
    }

    /// Undo the last mutation; a no-op when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let (nodes, edges) = (&mut self.nodes, &mut self.edges);
        let Some(previous) = self.history.undo(|| GraphSnapshot {
            nodes: std::mem::take(nodes),
            edges: std::mem::take(edges),
        }) else {
            return false;
        };
        self.restore(previous);
        tracing::debug!("Undo: {} nodes, {} edges", self.nodes.len(), self.edges.len());
        true
    }

    /// Redo the last undone mutation; a no-op when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let (nodes, edges) = (&mut self.nodes, &mut self.edges);
        let Some(next) = self.history.redo(|| GraphSnapshot {
            nodes: std::mem::take(nodes),
            edges: std::mem::take(edges),
        }) else {
            return false;
        };
        self.restore(next);
        tracing::debug!("Redo: {} nodes, {} edges", self.nodes.len(), self.edges.len());
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Description of the mutation undo would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    /// Description of the mutation redo would reapply
    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    /// Read-only access to the history
    pub fn history(&self) -> &History {
        &self.history
    }

    // ----- Nodes -----

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }

        self.checkpoint("Add node");
        tracing::debug!("Added node {} ({})", node.id, node.node_type);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        self.checkpoint("Remove node");
        self.edges.retain(|_, e| !e.involves_node(id));
        let removed = self.nodes.shift_remove(id);
        tracing::debug!("Removed node {id}");
        removed
    }

    /// Shallow-merge params into a node.
    ///
    /// A `ports` update on a boundary node is normalized first, and edges
    /// on renamed ports follow the rename. Edges left on ports that no
    /// longer exist are removed.
    pub fn update_node_params(&mut self, id: &NodeId, mut partial: Params) -> Result<()> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        let kind = node.kind();

        let mut renames = RenameMap::new();
        if kind.is_boundary() {
            if let Some(requested) = partial.get(PORTS_PARAM) {
                let requested = match requested {
                    ParamValue::String(raw) => parse_port_list(raw),
                    _ => Vec::new(),
                };
                let previous = node.dynamic_ports();
                let normalized = normalize_ports(&requested, &previous);
                renames = build_rename_map(&previous, &normalized);
                partial.insert(
                    PORTS_PARAM.to_string(),
                    ParamValue::String(encode_port_list(&normalized)),
                );
            }
        }

        self.checkpoint("Update node params");

        if let Some(node) = self.nodes.get_mut(id) {
            node.params.extend(partial);
        }

        if let Some(side) = kind.boundary_side() {
            let changed = remap_edges(self.edges.values_mut(), id, side, &renames);
            if changed > 0 {
                tracing::debug!("Remapped {changed} edges after renaming ports on {id}");
            }
        }
        if kind.has_dynamic_ports() {
            self.prune_dangling_edges(id);
        }

        tracing::debug!("Updated params of node {id}");
        Ok(())
    }

    fn prune_dangling_edges(&mut self, id: &NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let resolver = PortResolver::new(&self.catalog);
        let dangling: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|edge| {
                edge.handle_on(id)
                    .into_iter()
                    .any(|(side, handle)| !resolver.has_port(node, handle, side))
            })
            .map(|edge| edge.id.clone())
            .collect();

        for edge_id in dangling {
            tracing::warn!("Removing edge {edge_id}: its port on node {id} no longer exists");
            self.edges.shift_remove(&edge_id);
        }
    }

    /// Move a node without recording history, as a canvas drag does
    pub fn set_node_position(&mut self, id: &NodeId, position: Position) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Write a batch of positions as one undoable step
    pub fn apply_positions(&mut self, positions: &IndexMap<NodeId, Position>) -> usize {
        if !positions.keys().any(|id| self.nodes.contains_key(id)) {
            return 0;
        }

        self.checkpoint("Arrange nodes");
        let mut moved = 0;
        for (id, position) in positions {
            if let Some(node) = self.nodes.get_mut(id) {
                node.position = *position;
                moved += 1;
            }
        }
        moved
    }

    /// Lay out the whole graph and write the positions back
    pub fn auto_layout(&mut self, config: &LayoutConfig) -> IndexMap<NodeId, Position> {
        let positions = compute_layout(
            &self.resolver(),
            self.nodes.values(),
            self.edges.values(),
            config,
        );
        self.apply_positions(&positions);
        tracing::debug!("Auto layout placed {} nodes", positions.len());
        positions
    }

    // ----- Edges -----

    /// Add a caller-built edge after checking it connects compatible ports
    pub fn add_edge(&mut self, mut edge: Edge) -> Result<EdgeId> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        let port_type = self.check_connection(&edge)?;
        edge.port_type = Some(port_type);

        self.checkpoint("Connect");
        let id = edge.id.clone();
        tracing::debug!(
            "Connected {}.{} -> {}.{} ({port_type})",
            edge.source,
            edge.source_handle,
            edge.target,
            edge.target_handle
        );
        self.edges.insert(id.clone(), edge);
        Ok(id)
    }

    /// Connect an output port to an input port with a fresh edge ID
    pub fn connect(
        &mut self,
        source: &NodeId,
        source_handle: &str,
        target: &NodeId,
        target_handle: &str,
    ) -> Result<EdgeId> {
        self.add_edge(Edge::new(
            source.clone(),
            source_handle,
            target.clone(),
            target_handle,
        ))
    }

    fn check_connection(&self, edge: &Edge) -> Result<PortType> {
        let source = self
            .nodes
            .get(&edge.source)
            .ok_or_else(|| GraphError::NodeNotFound(edge.source.clone()))?;
        let target = self
            .nodes
            .get(&edge.target)
            .ok_or_else(|| GraphError::NodeNotFound(edge.target.clone()))?;

        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.source.clone()));
        }

        let duplicate = self.edges.values().any(|e| {
            e.source == edge.source
                && e.source_handle == edge.source_handle
                && e.target == edge.target
                && e.target_handle == edge.target_handle
        });
        if duplicate {
            return Err(GraphError::AlreadyConnected {
                source_node: edge.source.clone(),
                source_handle: edge.source_handle.clone(),
                target_node: edge.target.clone(),
                target_handle: edge.target_handle.clone(),
            });
        }

        let resolver = self.resolver();
        let source_type = resolver
            .resolve(source, &edge.source_handle, PortDirection::Output)
            .ok_or_else(|| GraphError::UnresolvedPort {
                node: edge.source.clone(),
                port: edge.source_handle.clone(),
                direction: PortDirection::Output,
            })?;
        let target_type = resolver
            .resolve(target, &edge.target_handle, PortDirection::Input)
            .ok_or_else(|| GraphError::UnresolvedPort {
                node: edge.target.clone(),
                port: edge.target_handle.clone(),
                direction: PortDirection::Input,
            })?;

        if !source_type.can_connect_to(&target_type) {
            return Err(GraphError::IncompatiblePorts {
                source_type,
                target_type,
            });
        }
        Ok(source_type)
    }

    /// Remove an edge
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        if !self.edges.contains_key(id) {
            return None;
        }

        self.checkpoint("Disconnect");
        tracing::debug!("Removed edge {id}");
        self.edges.shift_remove(id)
    }

    // ----- Whole graph -----

    /// Remove every node and edge and unbind the current file
    pub fn clear(&mut self) {
        self.checkpoint("Clear graph");
        self.nodes.clear();
        self.edges.clear();
        self.current_file = None;
        tracing::debug!("Cleared graph");
    }

    /// Replace the graph with a workflow document.
    ///
    /// Nodes missing from `positions` are placed left to right in document
    /// order. Connections to unknown nodes are dropped. The current file
    /// binding is reset: loading content is not opening a file.
    pub fn load_workflow(
        &mut self,
        document: WorkflowDocument,
        positions: Option<&HashMap<NodeId, Position>>,
    ) {
        self.checkpoint("Load workflow");
        self.nodes.clear();
        self.edges.clear();
        self.current_file = None;

        for (index, wire) in document.nodes.into_iter().enumerate() {
            if self.nodes.contains_key(&wire.id) {
                tracing::warn!("Skipping duplicate node id {} in workflow", wire.id);
                continue;
            }
            let position = positions
                .and_then(|p| p.get(&wire.id))
                .copied()
                .unwrap_or_else(|| fallback_position(index));

            let node = Node {
                id: wire.id,
                node_type: wire.node_type,
                params: import_params(wire.params),
                position,
            };
            self.nodes.insert(node.id.clone(), node);
        }

        for connection in document.connections {
            if !self.nodes.contains_key(&connection.from_node)
                || !self.nodes.contains_key(&connection.to_node)
            {
                tracing::warn!(
                    "Dropping connection {}.{} -> {}.{}: endpoint node missing",
                    connection.from_node,
                    connection.from_port,
                    connection.to_node,
                    connection.to_port
                );
                continue;
            }

            let id = self.unused_edge_id(EdgeId::for_connection(
                &connection.from_node,
                &connection.from_port,
                &connection.to_node,
                &connection.to_port,
            ));
            let edge = Edge {
                id,
                source: connection.from_node,
                source_handle: connection.from_port,
                target: connection.to_node,
                target_handle: connection.to_port,
                port_type: Some(connection.port_type),
            };
            self.edges.insert(edge.id.clone(), edge);
        }

        tracing::debug!(
            "Loaded workflow: {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        );
    }

    /// `base`, or `base#N` with the lowest N that no edge uses yet
    fn unused_edge_id(&self, base: EdgeId) -> EdgeId {
        if !self.edges.contains_key(&base) {
            return base;
        }
        let mut n = 2_usize;
        loop {
            let candidate = EdgeId::new(format!("{base}#{n}"));
            if !self.edges.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Produce the wire document for the current graph
    pub fn export_workflow(&self) -> WorkflowDocument {
        let nodes = self
            .nodes
            .values()
            .map(|node| WorkflowNode {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                params: export_params(&node.params),
            })
            .collect();

        let connections = self
            .edges
            .values()
            .filter_map(|edge| {
                let Some(port_type) = self.edge_type(edge) else {
                    tracing::warn!("Skipping edge {} with unresolvable type on export", edge.id);
                    return None;
                };
                Some(WorkflowConnection {
                    from_node: edge.source.clone(),
                    from_port: edge.source_handle.clone(),
                    to_node: edge.target.clone(),
                    to_port: edge.target_handle.clone(),
                    port_type,
                })
            })
            .collect();

        WorkflowDocument {
            nodes,
            connections,
            interface: self.interface(),
        }
    }

    /// Interface declared by the boundary nodes, if there are any
    pub fn interface(&self) -> Option<WorkflowInterface> {
        let mut interface = WorkflowInterface::default();
        let mut has_boundary = false;

        for node in self.nodes.values() {
            match node.kind() {
                NodeKind::WorkflowInput => interface.inputs.extend(node.dynamic_ports()),
                NodeKind::WorkflowOutput => interface.outputs.extend(node.dynamic_ports()),
                _ => continue,
            }
            has_boundary = true;
        }

        has_boundary.then_some(interface)
    }
}

fn fallback_position(index: usize) -> Position {
    Position::new(index as f32 * FALLBACK_COLUMN_WIDTH, FALLBACK_ROW_Y)
}
