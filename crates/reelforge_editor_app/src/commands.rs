// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the editor CLI.
//!
//! Each command loads a workflow into a fresh [`GraphStore`], so a file is
//! checked, laid out and exported by exactly the code the canvas uses.

use crate::settings::EditorSettings;
use anyhow::{Context, Result};
use reelforge_editor_graph::{builtin_catalog, GraphStore, NodeCatalog, WorkflowDocument};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Load the node catalog named in settings, or the built-in one
pub fn load_catalog(settings: &EditorSettings) -> Result<NodeCatalog> {
    let Some(path) = &settings.catalog else {
        return Ok(builtin_catalog());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read node catalog {}", path.display()))?;
    let catalog = NodeCatalog::from_json_str(&raw)
        .with_context(|| format!("Invalid node catalog {}", path.display()))?;
    tracing::info!("Loaded {} node types from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Open a workflow file into a new store bound to that file
pub fn open_workflow(
    path: &Path,
    catalog: Arc<NodeCatalog>,
    settings: &EditorSettings,
) -> Result<GraphStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workflow {}", path.display()))?;
    let document = WorkflowDocument::from_json_str(&raw)
        .with_context(|| format!("Failed to parse workflow {}", path.display()))?;

    let mut store = GraphStore::with_history_depth(catalog, settings.history_depth);
    store.load_workflow(document, None);
    store.set_current_file(Some(path.to_path_buf()));
    tracing::info!(
        "Opened {}: {} nodes, {} edges",
        path.display(),
        store.node_count(),
        store.edge_count()
    );
    Ok(store)
}

/// Validate a workflow and print the result; returns whether it is clean
pub fn check(store: &GraphStore, out: &mut impl Write) -> Result<bool> {
    let issues = store.validate();
    if issues.is_empty() {
        writeln!(out, "ok: {} nodes, {} edges", store.node_count(), store.edge_count())?;
        return Ok(true);
    }

    for issue in &issues {
        writeln!(out, "{issue}")?;
    }
    tracing::warn!("{} issues found", issues.len());
    Ok(false)
}

/// Print computed node positions as JSON
pub fn layout(
    store: &mut GraphStore,
    settings: &EditorSettings,
    out: &mut impl Write,
) -> Result<()> {
    let positions = store.auto_layout(&settings.layout);
    serde_json::to_writer_pretty(&mut *out, &positions).context("Failed to write positions")?;
    writeln!(out)?;
    Ok(())
}

/// Write the canonical form of the loaded workflow
pub fn export(store: &GraphStore, output: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let json = store.export_workflow().to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Exported workflow to {}", path.display());
        }
        None => writeln!(out, "{json}")?,
    }
    Ok(())
}

/// Print the node catalog as a JSON array of descriptors
pub fn catalog(catalog: &NodeCatalog, out: &mut impl Write) -> Result<()> {
    let descriptors: Vec<_> = catalog.descriptors().collect();
    serde_json::to_writer_pretty(&mut *out, &descriptors).context("Failed to write catalog")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("reelforge-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn sample() -> String {
        json!({
            "nodes": [
                { "id": "a", "node_type": "VideoInput", "params": { "path": "in.mkv" } },
                { "id": "b", "node_type": "Resize", "params": { "width": 1280, "height": 720 } }
            ],
            "connections": [
                {
                    "from_node": "a",
                    "from_port": "frames",
                    "to_node": "b",
                    "to_port": "frames",
                    "port_type": "VideoFrames"
                }
            ]
        })
        .to_string()
    }

    fn open(name: &str, contents: &str) -> GraphStore {
        let path = write_temp(name, contents);
        let settings = EditorSettings::default();
        let store = open_workflow(&path, Arc::new(builtin_catalog()), &settings).unwrap();
        std::fs::remove_file(&path).unwrap();
        store
    }

    #[test]
    fn test_open_binds_current_file() {
        let path = write_temp("bind.json", &sample());
        let store =
            open_workflow(&path, Arc::new(builtin_catalog()), &EditorSettings::default()).unwrap();
        assert_eq!(store.current_file(), Some(path.as_path()));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_check_reports_issues() {
        let store = open("ok.json", &sample());
        let mut out = Vec::new();
        assert!(check(&store, &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("ok: 2 nodes, 1 edges"));

        let broken = json!({
            "nodes": [{ "id": "b", "node_type": "Resize", "params": {} }],
            "connections": []
        })
        .to_string();
        let store = open("broken.json", &broken);
        let mut out = Vec::new();
        assert!(!check(&store, &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("missing required input 'width'"));
    }

    #[test]
    fn test_layout_prints_every_node() {
        let mut store = open("layout.json", &sample());
        let mut out = Vec::new();
        layout(&mut store, &EditorSettings::default(), &mut out).unwrap();

        let positions: Value = serde_json::from_slice(&out).unwrap();
        assert!(positions["a"]["x"].as_f64().unwrap() < positions["b"]["x"].as_f64().unwrap());
    }

    #[test]
    fn test_export_is_canonical() {
        let store = open("export.json", &sample());
        let mut out = Vec::new();
        export(&store, None, &mut out).unwrap();

        let exported: Value = serde_json::from_slice(&out).unwrap();
        let original: Value = serde_json::from_str(&sample()).unwrap();
        assert_eq!(exported, original);
    }

    #[test]
    fn test_catalog_lists_builtin_types() {
        let mut out = Vec::new();
        catalog(&builtin_catalog(), &mut out).unwrap();
        let listed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 22);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = open_workflow(
            Path::new("/nonexistent/workflow.json"),
            Arc::new(builtin_catalog()),
            &EditorSettings::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read workflow"));
    }
}
