//! Splitting tagged layers into one layer per class.
//!
//! Every tagged layer is replaced by a group with the layer's name, placed
//! where the layer stood among the top-level tree nodes. The group holds one
//! copy of the layer per class of its renderer, in legend order. Each copy
//! uses a rule-based renderer narrowed to the rules of its own class.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{default_destination, MARKER_PROPERTY};
use crate::error::Result;
use crate::marker::marked_layer_names;
use crate::project::{LayerTreeGroup, ProjectDocument};
use crate::renderer::{Renderer, RendererKind};

/// Why a tagged layer was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// No registry layer has the tagged name.
    Unresolved,
    /// The layer has no id.
    Invalid,
    /// The name is not among the top-level tree nodes.
    NotTopLevel,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unresolved => "no layer with this name",
            Self::Invalid => "layer has no id",
            Self::NotTopLevel => "not a top-level node of the layer tree",
        };
        f.write_str(text)
    }
}

/// A tagged layer that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLayer {
    pub name: String,
    pub reason: SkipReason,
}

/// A tagged layer that was replaced by a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedLayer {
    /// Name of the original layer and of the new group.
    pub name: String,
    /// Top-level position of the group.
    pub index: usize,
    /// Renderer of the original layer.
    pub renderer: RendererKind,
    /// Names of the layers in the group, in order.
    pub classes: Vec<String>,
}

/// Outcome of a split run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    /// The destination, or the unchanged source when nothing was tagged.
    pub output: PathBuf,
    /// Whether a file was written.
    pub written: bool,
    pub converted: Vec<ConvertedLayer>,
    pub skipped: Vec<SkippedLayer>,
    /// Generated layers whose class label matched no rule after conversion.
    pub empty_layers: Vec<String>,
}

impl SplitReport {
    fn new(output: PathBuf) -> Self {
        Self {
            output,
            written: false,
            converted: Vec::new(),
            skipped: Vec::new(),
            empty_layers: Vec::new(),
        }
    }

    fn skip(&mut self, name: &str, reason: SkipReason) {
        tracing::info!(layer = %name, %reason, "Skipping tagged layer");
        self.skipped.push(SkippedLayer {
            name: name.to_string(),
            reason,
        });
    }
}

/// Split a project file and write the result.
///
/// # Arguments
/// * `source` - Project to read; never modified
/// * `destination` - Where to write the split project
///
/// # Returns
/// `destination`, or `source` unchanged if no layer is tagged (in which
/// case nothing is written)
///
/// # Errors
/// Load errors for `source` and write errors for `destination`. Nothing is
/// written when loading fails.
pub fn split(source: &Path, destination: &Path) -> Result<PathBuf> {
    split_with_report(source, destination).map(|report| report.output)
}

/// Like [`split`], but return what was done.
pub fn split_with_report(source: &Path, destination: &Path) -> Result<SplitReport> {
    let mut project = ProjectDocument::load(source)?;

    if marked_layer_names(&project).is_empty() {
        tracing::info!(path = %source.display(), "No tagged layers, nothing to split");
        return Ok(SplitReport::new(source.to_path_buf()));
    }

    let mut report = split_project(&mut project);
    project.save_as(destination)?;
    report.output = destination.to_path_buf();
    report.written = true;

    tracing::info!(
        path = %destination.display(),
        converted = report.converted.len(),
        skipped = report.skipped.len(),
        "Wrote split project"
    );
    Ok(report)
}

/// Split a project next to itself.
///
/// Without a destination the result goes to `<stem>_categorized.<ext>` in
/// the source's directory.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use qgs_categorizer::split_categorized_layers;
///
/// let output = split_categorized_layers(Path::new("city.qgs"), None).unwrap();
/// assert_eq!(output, Path::new("city_categorized.qgs"));
/// ```
pub fn split_categorized_layers(source: &Path, destination: Option<&Path>) -> Result<PathBuf> {
    let destination = match destination {
        Some(path) => path.to_path_buf(),
        None => default_destination(source)?,
    };
    split(source, &destination)
}

/// Split the tagged layers of an in-memory project.
///
/// The returned report's `output` is the project's backing file, if any;
/// nothing is written.
pub fn split_project(project: &mut ProjectDocument) -> SplitReport {
    let mut report = SplitReport::new(project.path().map(Path::to_path_buf).unwrap_or_default());

    let ordering = project.layer_tree().top_level_names();
    let marked = marked_layer_names(project);

    for name in processing_order(&ordering, &marked) {
        let Some(base) = project.find_by_name(&name).cloned() else {
            report.skip(&name, SkipReason::Unresolved);
            continue;
        };
        if !base.is_valid() {
            report.skip(&name, SkipReason::Invalid);
            continue;
        }
        let Some(index) = ordering.iter().position(|n| *n == name) else {
            report.skip(&name, SkipReason::NotTopLevel);
            continue;
        };

        let renderer = base.renderer();
        let items = renderer.classification_items();
        if items.is_empty() {
            tracing::warn!(
                layer = %name,
                renderer = renderer.kind().as_str(),
                "Renderer has no classes; the layer is replaced by an empty group"
            );
        }
        tracing::info!(layer = %name, index, classes = items.len(), "Splitting layer");

        let mut group = LayerTreeGroup::new(&name);
        let mut class_ids = Vec::with_capacity(items.len());
        let mut classes = Vec::with_capacity(items.len());

        for item in &items {
            let mut class_layer = base.duplicate();
            class_layer.set_name(&item.label);
            class_layer.set_title(&item.label);
            class_layer.set_short_name(&item.label);
            // The tag is consumed by the split.
            class_layer.remove_custom_property(MARKER_PROPERTY);

            // Always converted from the original renderer, never from a
            // previously narrowed copy.
            if let Some(mut rule_based) = renderer.to_rule_based() {
                if rule_based.retain_label(&item.label) == 0 {
                    tracing::warn!(
                        layer = %name,
                        class = %item.label,
                        "No rule left for class after conversion"
                    );
                    report.empty_layers.push(item.label.clone());
                }
                class_layer.set_renderer(&Renderer::RuleBased(rule_based));
            }

            group.add_layer(&class_layer);
            class_ids.push(class_layer.id());
            classes.push(item.label.clone());
            project.add_layer(class_layer);
        }

        let base_id = base.id();
        project.layer_tree_mut().insert_group(index, group);
        project.replace_in_layer_order(&base_id, &class_ids);
        project.remove_layer(&base_id);

        report.converted.push(ConvertedLayer {
            name,
            index,
            renderer: renderer.kind(),
            classes,
        });
    }

    report
}

/// Tagged names, deduplicated, in top-level tree order.
///
/// Each name is resolved once, so of several layers sharing a tagged name
/// only the first in the registry is split.
///
/// Names missing from the tree come last, in registry order, so they are
/// reported as skipped rather than silently dropped.
fn processing_order(ordering: &[String], marked: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ordering
        .iter()
        .filter(|name| marked.contains(*name))
        .chain(marked.iter())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
