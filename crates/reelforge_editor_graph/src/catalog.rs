// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node descriptor catalog.
//!
//! Mirrors the node types the execution backend registers. Stream ports
//! carry frames and metadata; param ports carry configuration values.

use crate::node::{NodeCatalog, NodeDescriptor, PortDescriptor};
use crate::port::PortType;
use serde_json::json;

const SCALAR_TYPES: [&str; 5] = ["Int", "Float", "Str", "Bool", "Path"];
const BACKENDS: [&str; 2] = ["cuda", "tensorrt"];
const SCALERS: [&str; 2] = ["bilinear", "nearest"];

fn descriptor(
    node_type: &str,
    display_name: &str,
    category: &str,
    accent_color: &str,
    icon: &str,
    inputs: Vec<PortDescriptor>,
    outputs: Vec<PortDescriptor>,
) -> NodeDescriptor {
    NodeDescriptor {
        node_type: node_type.to_string(),
        display_name: display_name.to_string(),
        category: category.to_string(),
        accent_color: accent_color.to_string(),
        icon: icon.to_string(),
        inputs,
        outputs,
    }
}

/// Create the catalog of built-in node types
pub fn builtin_catalog() -> NodeCatalog {
    let mut catalog = NodeCatalog::new();

    // Sources
    catalog.register(descriptor(
        "VideoInput",
        "Video Input",
        "input",
        "#A855F7",
        "file-video",
        vec![PortDescriptor::param("path", PortType::Path)],
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::stream("metadata", PortType::Metadata),
            PortDescriptor::param("source_path", PortType::Path),
        ],
    ));
    catalog.register(descriptor(
        "Downloader",
        "Downloader",
        "input",
        "#A855F7",
        "download",
        vec![PortDescriptor::param("url", PortType::Str)],
        vec![PortDescriptor::param("path", PortType::Path)],
    ));
    catalog.register(descriptor(
        "JellyfinVideo",
        "Jellyfin Video",
        "input",
        "#A855F7",
        "tv",
        vec![
            PortDescriptor::param("jellyfin_url", PortType::Str),
            PortDescriptor::param("api_key", PortType::Str),
            PortDescriptor::param("item_id", PortType::Str),
        ],
        vec![PortDescriptor::param("video_url", PortType::Str)],
    ));

    // Model inference
    catalog.register(descriptor(
        "SuperResolution",
        "Super Resolution",
        "processing",
        "#F97316",
        "microscope",
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::param("model_path", PortType::Path).with_hint("model_selector"),
            PortDescriptor::optional("scale", PortType::Int, json!(4)),
            PortDescriptor::optional("tile_size", PortType::Int, json!(0)),
            PortDescriptor::optional("device_id", PortType::Int, json!(0)),
            PortDescriptor::optional("backend", PortType::Str, json!("cuda"))
                .with_options(&BACKENDS),
        ],
        vec![PortDescriptor::stream("frames", PortType::VideoFrames)],
    ));
    catalog.register(descriptor(
        "FrameInterpolation",
        "Frame Interpolation",
        "processing",
        "#06B6D4",
        "film",
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::param("model_path", PortType::Path).with_hint("model_selector"),
            PortDescriptor::optional("multiplier", PortType::Int, json!(2)),
            PortDescriptor::optional("device_id", PortType::Int, json!(0)),
            PortDescriptor::optional("backend", PortType::Str, json!("cuda"))
                .with_options(&BACKENDS),
        ],
        vec![PortDescriptor::stream("frames", PortType::VideoFrames)],
    ));

    // Frame processing
    catalog.register(descriptor(
        "Resize",
        "Resize",
        "processing",
        "#3B82F6",
        "scaling",
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::param("width", PortType::Int),
            PortDescriptor::param("height", PortType::Int),
            PortDescriptor::optional("algorithm", PortType::Str, json!("bilinear"))
                .with_options(&SCALERS),
        ],
        vec![PortDescriptor::stream("frames", PortType::VideoFrames)],
    ));
    catalog.register(descriptor(
        "Rescale",
        "Rescale",
        "processing",
        "#3B82F6",
        "scaling",
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::param("scale_factor", PortType::Float),
            PortDescriptor::optional("algorithm", PortType::Str, json!("bilinear"))
                .with_options(&SCALERS),
        ],
        vec![PortDescriptor::stream("frames", PortType::VideoFrames)],
    ));
    catalog.register(descriptor(
        "ColorSpace",
        "Color Space",
        "processing",
        "#EAB308",
        "palette",
        vec![
            PortDescriptor::optional("matrix", PortType::Str, json!("bt709"))
                .with_options(&["bt709", "bt601", "bt2020"]),
            PortDescriptor::optional("range", PortType::Str, json!("limited"))
                .with_options(&["limited", "full"]),
            PortDescriptor::optional("transfer", PortType::Str, json!("bt709")),
            PortDescriptor::optional("primaries", PortType::Str, json!("bt709")),
            PortDescriptor::optional("dither", PortType::Str, json!("error_diffusion")),
        ],
        vec![PortDescriptor::param("config", PortType::Str)],
    ));
    catalog.register(descriptor(
        "SceneDetect",
        "Scene Detect",
        "processing",
        "#EF4444",
        "scissors",
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::optional("threshold", PortType::Float, json!(0.3)),
        ],
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::param("is_scene_change", PortType::Bool),
        ],
    ));

    // Sinks
    catalog.register(descriptor(
        "VideoOutput",
        "Video Output",
        "output",
        "#10B981",
        "hard-drive",
        vec![
            PortDescriptor::stream("frames", PortType::VideoFrames),
            PortDescriptor::param("source_path", PortType::Path),
            PortDescriptor::param("output_path", PortType::Path),
            PortDescriptor::optional("codec", PortType::Str, json!("libx265"))
                .with_options(&["libx265", "libx264"]),
            PortDescriptor::optional("crf", PortType::Int, json!(18)),
            PortDescriptor::optional("pixel_format", PortType::Str, json!("yuv420p10le"))
                .with_options(&["yuv420p10le", "yuv420p"]),
            PortDescriptor::param("width", PortType::Int),
            PortDescriptor::param("height", PortType::Int),
            PortDescriptor::param("fps", PortType::Str),
        ],
        vec![PortDescriptor::param("output_path", PortType::Path)],
    ));
    catalog.register(descriptor(
        "StreamOutput",
        "Stream Output",
        "output",
        "#10B981",
        "radio",
        vec![
            PortDescriptor::param("url", PortType::Str),
            PortDescriptor::optional("codec", PortType::Str, json!("libx264"))
                .with_options(&["libx265", "libx264"]),
            PortDescriptor::optional("bitrate", PortType::Str, json!("5M")),
            PortDescriptor::optional("format", PortType::Str, json!("flv"))
                .with_options(&["flv", "mpegts", "rtsp"]),
            PortDescriptor::optional("source_url", PortType::Str, json!("")),
        ],
        vec![PortDescriptor::param("output_url", PortType::Str)],
    ));

    // Utilities
    catalog.register(descriptor(
        "Constant",
        "Constant",
        "utility",
        "#6366F1",
        "hash",
        vec![
            PortDescriptor::optional("type", PortType::Str, json!("Int"))
                .with_options(&SCALAR_TYPES),
            PortDescriptor::optional("value", PortType::Str, json!("0")),
        ],
        vec![PortDescriptor::param("value", PortType::Int).with_dynamic_type("type")],
    ));
    catalog.register(descriptor(
        "Print",
        "Print",
        "utility",
        "#6366F1",
        "hash",
        vec![
            PortDescriptor::optional("value_type", PortType::Str, json!("Str"))
                .with_options(&SCALAR_TYPES),
            PortDescriptor::param("value", PortType::Str).with_dynamic_type("value_type"),
        ],
        vec![PortDescriptor::param("value", PortType::Str).with_dynamic_type("value_type")],
    ));
    catalog.register(descriptor(
        "PathDivider",
        "Path Divider",
        "utility",
        "#6366F1",
        "split",
        vec![PortDescriptor::param("path", PortType::Path)],
        vec![
            PortDescriptor::param("parent_path", PortType::Path),
            PortDescriptor::param("file_name", PortType::Str),
            PortDescriptor::param("file_stem", PortType::Str),
            PortDescriptor::param("file_extension", PortType::Str),
        ],
    ));
    catalog.register(descriptor(
        "PathJoiner",
        "Path Joiner",
        "utility",
        "#6366F1",
        "split",
        vec![
            PortDescriptor::param("parent_path", PortType::Path),
            PortDescriptor::optional("sub_path", PortType::Path, json!("")),
            PortDescriptor::optional("file_name", PortType::Str, json!("")),
        ],
        vec![PortDescriptor::param("path", PortType::Path)],
    ));
    catalog.register(descriptor(
        "StringTemplate",
        "String Template",
        "utility",
        "#6366F1",
        "braces",
        vec![
            PortDescriptor::optional("num_input", PortType::Int, json!(0)),
            PortDescriptor::optional("template", PortType::Str, json!("")),
            PortDescriptor::optional("strict", PortType::Bool, json!(true)),
        ],
        vec![PortDescriptor::param("value", PortType::Str)],
    ));
    catalog.register(descriptor(
        "StringReplace",
        "String Replace",
        "utility",
        "#6366F1",
        "replace",
        vec![
            PortDescriptor::param("input", PortType::Str),
            PortDescriptor::param("old", PortType::Str),
            PortDescriptor::param("new", PortType::Str),
        ],
        vec![PortDescriptor::param("output", PortType::Str)],
    ));
    catalog.register(descriptor(
        "TypeConversion",
        "Type Conversion",
        "utility",
        "#6366F1",
        "arrow-left-right",
        vec![
            PortDescriptor::optional("input_type", PortType::Str, json!("Int"))
                .with_options(&SCALAR_TYPES),
            PortDescriptor::optional("output_type", PortType::Str, json!("Int"))
                .with_options(&SCALAR_TYPES),
            PortDescriptor::param("value", PortType::Int).with_dynamic_type("input_type"),
        ],
        vec![PortDescriptor::param("value", PortType::Int).with_dynamic_type("output_type")],
    ));
    catalog.register(descriptor(
        "HttpRequest",
        "HTTP Request",
        "utility",
        "#6366F1",
        "globe",
        vec![
            PortDescriptor::optional("method", PortType::Str, json!("GET")),
            PortDescriptor::param("url", PortType::Str),
            PortDescriptor::optional("headers_json", PortType::Str, json!("{}")),
            PortDescriptor::optional("body", PortType::Str, json!("")),
            PortDescriptor::optional("timeout_ms", PortType::Int, json!(30000)),
            PortDescriptor::optional("max_retries", PortType::Int, json!(2)),
            PortDescriptor::optional("retry_backoff_ms", PortType::Int, json!(250)),
            PortDescriptor::optional("max_response_bytes", PortType::Int, json!(1_048_576)),
        ],
        vec![
            PortDescriptor::param("status_code", PortType::Int),
            PortDescriptor::param("ok", PortType::Bool),
            PortDescriptor::param("response_body", PortType::Str),
            PortDescriptor::param("response_url", PortType::Str),
            PortDescriptor::param("content_type", PortType::Str),
        ],
    ));

    // Workflow composition; ports come from params
    catalog.register(descriptor(
        "WorkflowInput",
        "Workflow Input",
        "workflow",
        "#EAB308",
        "arrow-down-to-line",
        vec![],
        vec![],
    ));
    catalog.register(descriptor(
        "WorkflowOutput",
        "Workflow Output",
        "workflow",
        "#EAB308",
        "arrow-up-from-line",
        vec![],
        vec![],
    ));
    catalog.register(descriptor(
        "Workflow",
        "Workflow",
        "workflow",
        "#EAB308",
        "workflow",
        vec![
            PortDescriptor::param("workflow_path", PortType::WorkflowPath)
                .with_hint("workflow_picker"),
        ],
        vec![],
    ));

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortKind;

    #[test]
    fn test_builtin_catalog_count() {
        assert_eq!(builtin_catalog().len(), 22);
    }

    #[test]
    fn test_video_input_descriptor() {
        let catalog = builtin_catalog();
        let vi = catalog.get("VideoInput").unwrap();
        assert_eq!(vi.display_name, "Video Input");
        assert_eq!(vi.inputs.len(), 1);
        assert_eq!(vi.outputs.len(), 3);
        assert_eq!(vi.outputs[1].direction, PortKind::Stream);
    }

    #[test]
    fn test_path_joiner_defaults() {
        let catalog = builtin_catalog();
        let joiner = catalog.get("PathJoiner").unwrap();
        let sub = joiner.inputs.iter().find(|p| p.name == "sub_path").unwrap();
        assert!(!sub.required);
        assert_eq!(sub.default_value, Some(json!("")));
        assert!(joiner.inputs[0].required);
    }

    #[test]
    fn test_catalog_json_round_trip() {
        let catalog = builtin_catalog();
        let json = serde_json::to_string(&catalog.descriptors().collect::<Vec<_>>()).unwrap();
        let parsed = NodeCatalog::from_json_str(&json).unwrap();
        assert_eq!(parsed.len(), catalog.len());
        assert_eq!(parsed.get("TypeConversion"), catalog.get("TypeConversion"));
    }

    #[test]
    fn test_categories() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.in_category("workflow").count(), 3);
        assert_eq!(catalog.in_category("output").count(), 2);
    }
}
