// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of whole-graph snapshots.
//!
//! Snapshots are deep copies taken eagerly before each mutation. They own
//! their nodes and edges, so later edits to the live graph cannot reach
//! into a stored entry.

use crate::connection::{Edge, EdgeId};
use crate::node::{Node, NodeId};
use indexmap::IndexMap;
use std::collections::VecDeque;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 50;

/// Point-in-time copy of the node and edge collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    /// Nodes, in insertion order
    pub nodes: IndexMap<NodeId, Node>,
    /// Edges, in insertion order
    pub edges: IndexMap<EdgeId, Edge>,
}

/// A history stack element
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Human-readable description of the mutation
    pub description: String,
    /// Graph state on the other side of the mutation
    pub snapshot: GraphSnapshot,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_depth: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state before a mutation; clears the redo stack
    pub fn record(&mut self, description: impl Into<String>, before: GraphSnapshot) {
        self.redo_stack.clear();
        self.undo_stack.push_back(HistoryEntry {
            description: description.into(),
            snapshot: before,
        });

        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back, parking the current state on the redo stack.
    ///
    /// `current` is only called when there is something to undo, so the
    /// caller may move its live state out inside it.
    pub fn undo(&mut self, current: impl FnOnce() -> GraphSnapshot) -> Option<GraphSnapshot> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(HistoryEntry {
            description: entry.description,
            snapshot: current(),
        });
        Some(entry.snapshot)
    }

    /// Step forward, parking the current state on the undo stack
    pub fn redo(&mut self, current: impl FnOnce() -> GraphSnapshot) -> Option<GraphSnapshot> {
        let entry = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(HistoryEntry {
            description: entry.description,
            snapshot: current(),
        });
        Some(entry.snapshot)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of undo entries kept
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(ids: &[&str]) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        for id in ids {
            let node = Node::new(*id, "Resize");
            snapshot.nodes.insert(node.id.clone(), node);
        }
        snapshot
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new();
        history.record("Add node", snapshot_with(&[]));

        let restored = history.undo(|| snapshot_with(&["a"])).unwrap();
        assert!(restored.nodes.is_empty());
        assert_eq!(history.redo_description(), Some("Add node"));

        let redone = history.redo(|| restored).unwrap();
        assert_eq!(redone.nodes.len(), 1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = History::new();
        assert!(history.undo(|| panic!("nothing to park")).is_none());
        assert!(history.redo(|| panic!("nothing to park")).is_none());
        assert_eq!(history.undo_description(), None);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record("first", snapshot_with(&[]));
        history.undo(|| snapshot_with(&["a"]));
        assert!(history.can_redo());

        history.record("second", snapshot_with(&[]));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_limit_drops_oldest() {
        let mut history = History::with_max_depth(3);
        for i in 0..5 {
            history.record(format!("op {i}"), snapshot_with(&[]));
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(history.undo_description(), Some("op 4"));
    }
}
