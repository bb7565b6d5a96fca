//! Layer summaries for the `inspect` command.

use serde::Serialize;

use crate::error::Result;
use crate::marker::is_marked;
use crate::project::{MapLayer, ProjectDocument};
use crate::renderer::RendererKind;

/// What the splitter would see for one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
    pub renderer: RendererKind,
    pub classes: Vec<String>,
    pub marked: bool,
    /// Whether the layer sits directly under the tree root.
    pub top_level: bool,
}

impl LayerSummary {
    fn new(layer: &MapLayer, top_level_names: &[String]) -> Self {
        let renderer = layer.renderer();
        let name = layer.name();
        Self {
            top_level: top_level_names.contains(&name),
            id: layer.id(),
            crs: layer.crs_authid(),
            renderer: renderer.kind(),
            classes: renderer
                .classification_items()
                .into_iter()
                .map(|item| item.label)
                .collect(),
            marked: is_marked(layer),
            name,
        }
    }
}

/// Summarize every registry layer, in registry order.
#[must_use]
pub fn summarize(project: &ProjectDocument) -> Vec<LayerSummary> {
    let top_level_names = project.layer_tree().top_level_names();
    project
        .all_layers()
        .iter()
        .map(|layer| LayerSummary::new(layer, &top_level_names))
        .collect()
}

/// Summarize every layer as YAML.
pub fn summary_yaml(project: &ProjectDocument) -> Result<String> {
    Ok(serde_yaml_ng::to_string(&summarize(project))?)
}
