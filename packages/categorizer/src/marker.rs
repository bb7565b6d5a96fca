//! Tagging layers for splitting.
//!
//! A layer is tagged by the [`MARKER_PROPERTY`] custom property. The flag
//! states intent ("split this on the next run"), not a record of a past
//! transformation.

use std::collections::HashSet;

use crate::config::{is_marked_value, MARKER_DEFAULT, MARKER_PROPERTY, MARKER_TRUE};
use crate::error::Result;
use crate::project::{MapLayer, ProjectDocument};

/// Tag exactly the layers named in `eligible` and save the project.
///
/// Every registry layer whose name is in `eligible` gets the marker set to
/// `"true"`; every other layer has the marker removed. The project is
/// written once, to its backing file, after all layers are updated.
///
/// Calling this twice with different sets leaves exactly the second set
/// tagged.
///
/// # Arguments
/// * `eligible` - Names of the layers to tag
/// * `project` - Project loaded from (or saved to) a file
///
/// # Errors
/// `NoBackingPath` if the project has no backing file, or any write error.
pub fn mark_for_conversion(eligible: &HashSet<String>, project: &mut ProjectDocument) -> Result<()> {
    let mut tagged = 0usize;
    for layer in project.all_layers_mut() {
        let name = layer.name();
        if eligible.contains(&name) {
            layer.set_custom_property(MARKER_PROPERTY, MARKER_TRUE);
            tagged += 1;
            tracing::debug!(layer = %name, "Tagged layer for splitting");
        } else if layer.remove_custom_property(MARKER_PROPERTY) {
            tracing::debug!(layer = %name, "Removed split tag");
        }
    }

    let unknown: Vec<&String> = eligible
        .iter()
        .filter(|name| project.find_by_name(name).is_none())
        .collect();
    if !unknown.is_empty() {
        tracing::warn!(names = ?unknown, "No layer with these names; nothing tagged for them");
    }

    project.save()?;
    tracing::info!(tagged, "Saved layer tags");
    Ok(())
}

/// Whether a layer carries the split tag.
#[must_use]
pub fn is_marked(layer: &MapLayer) -> bool {
    is_marked_value(layer.custom_property_or(MARKER_PROPERTY, MARKER_DEFAULT))
}

/// Names of the tagged layers, in registry order.
#[must_use]
pub fn marked_layer_names(project: &ProjectDocument) -> Vec<String> {
    project
        .all_layers()
        .iter()
        .filter(|layer| is_marked(layer))
        .map(MapLayer::name)
        .collect()
}
