// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline graph model for the ReelForge editor.
//!
//! This crate holds the editable state behind the video pipeline canvas:
//! - Effective port type resolution, including ports declared by params
//! - Normalization of user-edited workflow boundary ports
//! - The graph store with undo/redo and workflow import/export
//! - Deterministic layered auto-layout
//!
//! ## Architecture
//!
//! [`GraphStore`] owns nodes and edges and is the only thing that mutates
//! them. It consults a read-only [`NodeCatalog`] through a [`PortResolver`]
//! whenever it needs to know what ports a node has. Documents crossing the
//! backend boundary are [`WorkflowDocument`]s.

pub mod catalog;
pub mod connection;
pub mod document;
pub mod dynamic_ports;
pub mod graph;
pub mod history;
pub mod layout;
pub mod node;
pub mod port;
pub mod resolve;
pub mod shared;
pub mod validation;

pub use catalog::builtin_catalog;
pub use connection::{Edge, EdgeId};
pub use document::{
    DocumentError, WorkflowConnection, WorkflowDocument, WorkflowInterface, WorkflowNode,
};
pub use graph::{GraphError, GraphStore};
pub use history::{GraphSnapshot, History, MAX_HISTORY};
pub use layout::{compute_layout, LayoutConfig};
pub use node::{
    Node, NodeCatalog, NodeDescriptor, NodeId, NodeKind, ParamValue, Params, PortDescriptor,
    Position,
};
pub use port::{PortDirection, PortKind, PortType, WorkflowPort};
pub use resolve::PortResolver;
pub use shared::SharedGraphStore;
pub use validation::ValidationIssue;
