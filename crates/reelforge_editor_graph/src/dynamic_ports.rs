// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamic port normalization and edge remapping.
//!
//! Boundary nodes declare their ports as an editable list. Before such a
//! list is committed it is normalized so every name is non-empty and
//! unique, and edges attached to renamed ports are rewritten to follow
//! them.
//!
//! Normalization runs in two passes:
//! 1. Lock: walking left to right, a name stays as-is when it equals the
//!    previous list's name at the same index and no lower index has
//!    already locked it.
//! 2. Assign: every other name keeps its requested form if still free,
//!    otherwise it gets the lowest free `_2`, `_3`, ... suffix.
//!
//! Ports the user did not touch therefore never move, and an edited port
//! that collides with one of them is the one that gets suffixed.

use crate::connection::Edge;
use crate::node::NodeId;
use crate::port::{PortDirection, WorkflowPort};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Old name to new name for ports renamed by normalization
pub type RenameMap = IndexMap<String, String>;

/// Normalize a requested port list against the previously committed one
pub fn normalize_ports(requested: &[WorkflowPort], previous: &[WorkflowPort]) -> Vec<WorkflowPort> {
    let base_names: Vec<String> = requested
        .iter()
        .enumerate()
        .map(|(index, port)| {
            let trimmed = port.name.trim();
            if trimmed.is_empty() {
                format!("port_{}", index + 1)
            } else {
                trimmed.to_string()
            }
        })
        .collect();

    let mut reserved: HashSet<String> = HashSet::new();
    let mut locked = vec![false; base_names.len()];
    for (index, name) in base_names.iter().enumerate() {
        let unchanged = previous.get(index).is_some_and(|prev| prev.name == *name);
        if unchanged && reserved.insert(name.clone()) {
            locked[index] = true;
        }
    }

    let mut normalized = Vec::with_capacity(requested.len());
    for (index, (port, base)) in requested.iter().zip(&base_names).enumerate() {
        let name = if locked[index] {
            base.clone()
        } else {
            let name = unique_name(base, &reserved);
            reserved.insert(name.clone());
            name
        };

        normalized.push(WorkflowPort {
            name,
            ..port.clone()
        });
    }

    normalized
}

fn unique_name(base: &str, reserved: &HashSet<String>) -> String {
    if !reserved.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|suffix| format!("{base}_{suffix}"))
        .find(|candidate| !reserved.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Pair previous and normalized names by position and record the changes.
///
/// Only the first mapping for a given old name is kept.
pub fn build_rename_map(previous: &[WorkflowPort], normalized: &[WorkflowPort]) -> RenameMap {
    let mut renames = RenameMap::new();
    for (old, new) in previous.iter().zip(normalized) {
        if old.name != new.name && !renames.contains_key(&old.name) {
            renames.insert(old.name.clone(), new.name.clone());
        }
    }
    renames
}

/// Rewrite handles on `node_id`'s `side` that appear in the rename map.
///
/// Each handle is looked up once, so swaps (`a -> b`, `b -> a`) are
/// applied simultaneously. Returns the number of edges changed.
pub fn remap_edges<'a>(
    edges: impl IntoIterator<Item = &'a mut Edge>,
    node_id: &NodeId,
    side: PortDirection,
    renames: &RenameMap,
) -> usize {
    if renames.is_empty() {
        return 0;
    }

    let mut changed = 0;
    for edge in edges {
        let handle = match side {
            PortDirection::Output if edge.source == *node_id => &mut edge.source_handle,
            PortDirection::Input if edge.target == *node_id => &mut edge.target_handle,
            _ => continue,
        };
        if let Some(new_name) = renames.get(handle.as_str()) {
            *handle = new_name.clone();
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortType;

    fn ports(names: &[&str]) -> Vec<WorkflowPort> {
        names.iter().map(|n| WorkflowPort::new(*n, PortType::Str)).collect()
    }

    fn names(ports: &[WorkflowPort]) -> Vec<&str> {
        ports.iter().map(|p| p.name.as_str()).collect()
    }

    fn assert_unique(ports: &[WorkflowPort]) {
        let set: HashSet<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(set.len(), ports.len());
    }

    #[test]
    fn test_blank_names_get_positional_fallback() {
        let result = normalize_ports(&ports(&["", "  ", "gain"]), &[]);
        assert_eq!(names(&result), vec!["port_1", "port_2", "gain"]);
    }

    #[test]
    fn test_duplicate_suffixes_ascend() {
        let result = normalize_ports(&ports(&["a", "a", "a"]), &[]);
        assert_eq!(names(&result), vec!["a", "a_2", "a_3"]);
        assert_unique(&result);
    }

    #[test]
    fn test_locked_name_keeps_position_zero() {
        let result = normalize_ports(&ports(&["beta", "beta"]), &ports(&["beta", "delta"]));
        assert_eq!(names(&result), vec!["beta", "beta_2"]);
        assert_unique(&result);
    }

    #[test]
    fn test_edited_port_yields_to_untouched_one() {
        let result = normalize_ports(&ports(&["a", "a"]), &ports(&["b", "a"]));
        assert_eq!(names(&result), vec!["a_2", "a"]);
        assert_unique(&result);
    }

    #[test]
    fn test_untouched_ports_keep_names() {
        let result = normalize_ports(
            &ports(&["in", "gain", "out"]),
            &ports(&["in", "gain", "out"]),
        );
        assert_eq!(names(&result), vec!["in", "gain", "out"]);
        assert!(build_rename_map(&ports(&["in", "gain", "out"]), &result).is_empty());
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let result = normalize_ports(&ports(&["x", "x_2", "x"]), &ports(&["x", "x_2", "y"]));
        assert_eq!(names(&result), vec!["x", "x_2", "x_3"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_ports(&ports(&["a", "", "a", " b "]), &[]);
        assert_unique(&once);
        assert_eq!(normalize_ports(&once, &once), once);
        assert_eq!(normalize_ports(&once, &[]), once);
    }

    #[test]
    fn test_normalize_keeps_type_and_default() {
        let requested =
            vec![WorkflowPort::new("", PortType::Int).with_default(serde_json::json!(5))];
        let result = normalize_ports(&requested, &[]);
        assert_eq!(result[0].port_type, "Int");
        assert_eq!(result[0].default_value, Some(serde_json::json!(5)));
    }

    #[test]
    fn test_rename_map() {
        let previous = ports(&["a", "b", "c"]);
        let normalized = ports(&["a", "z", "c", "d"]);
        let renames = build_rename_map(&previous, &normalized);
        assert_eq!(renames.len(), 1);
        assert_eq!(renames.get("b").map(String::as_str), Some("z"));
    }

    #[test]
    fn test_rename_map_keeps_first_occurrence() {
        let renames = build_rename_map(&ports(&["a", "a"]), &ports(&["x", "y"]));
        assert_eq!(renames.get("a").map(String::as_str), Some("x"));
        assert_eq!(renames.len(), 1);
    }

    #[test]
    fn test_remap_edges_only_touches_matching_side() {
        let input: NodeId = "in".into();
        let mut edges = vec![
            Edge::new("in", "old", "x", "value"),
            Edge::new("in", "keep", "x", "other"),
            Edge::new("y", "old", "in", "old"),
        ];
        let mut renames = RenameMap::new();
        renames.insert("old".to_string(), "new".to_string());

        let changed = remap_edges(edges.iter_mut(), &input, PortDirection::Output, &renames);
        assert_eq!(changed, 1);
        assert_eq!(edges[0].source_handle, "new");
        assert_eq!(edges[1].source_handle, "keep");
        assert_eq!(edges[2].source_handle, "old");
        assert_eq!(edges[2].target_handle, "old");
    }

    #[test]
    fn test_remap_edges_swap() {
        let output: NodeId = "out".into();
        let mut edges = vec![
            Edge::new("a", "v", "out", "left"),
            Edge::new("b", "v", "out", "right"),
        ];
        let renames = build_rename_map(&ports(&["left", "right"]), &ports(&["right", "left"]));

        remap_edges(edges.iter_mut(), &output, PortDirection::Input, &renames);
        assert_eq!(edges[0].target_handle, "right");
        assert_eq!(edges[1].target_handle, "left");
    }
}
