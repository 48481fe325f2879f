// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings persisted as RON.

use reelforge_editor_graph::{LayoutConfig, MAX_HISTORY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default log filter when neither `RUST_LOG` nor the settings file set one
pub const DEFAULT_LOG_FILTER: &str = "reelforge_editor_app=info,reelforge_editor_graph=info";

/// Settings that shape how the editor treats a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Auto-layout sizing and spacing
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Number of undo steps kept
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    /// `tracing` filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// JSON node catalog to use instead of the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

fn default_history_depth() -> usize {
    MAX_HISTORY
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            history_depth: default_history_depth(),
            log_filter: default_log_filter(),
            catalog: None,
        }
    }
}

impl EditorSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        ron::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_roundtrip() {
        let mut settings = EditorSettings::default();
        settings.history_depth = 20;
        settings.layout.rank_separation = 120.0;

        let ron_str =
            ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: EditorSettings = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let loaded: EditorSettings = ron::from_str("(history_depth: 10)").unwrap();
        assert_eq!(loaded.history_depth, 10);
        assert_eq!(loaded.layout, LayoutConfig::default());
        assert_eq!(loaded.log_filter, DEFAULT_LOG_FILTER);
        assert!(loaded.catalog.is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("reelforge-settings-{}.ron", std::process::id()));
        let settings = EditorSettings {
            catalog: Some(PathBuf::from("nodes.json")),
            ..EditorSettings::default()
        };

        settings.save(&path).unwrap();
        let loaded = EditorSettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }
}
