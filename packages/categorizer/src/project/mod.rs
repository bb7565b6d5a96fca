//! QGIS project document model.
//!
//! A [`ProjectDocument`] owns three things: the layer registry
//! (`<projectlayers>`), the layer tree (`<layer-tree-group>`) and the rest of
//! the XML, which is carried through untouched.

mod document;
mod layer;
mod properties;
mod tree;

pub use document::{ProjectDocument, PROJECT_ROOT};
pub use layer::MapLayer;
pub use properties::{get_property, properties, remove_property, set_property, CUSTOM_PROPERTIES};
pub use tree::{LayerTree, LayerTreeGroup, LayerTreeMut, LayerTreeNode, GROUP_ELEMENT, LAYER_ELEMENT};
