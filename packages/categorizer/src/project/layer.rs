//! Map layers (`<maplayer>` entries of the layer registry).

use crate::config::generate_layer_id;
use crate::renderer::{Renderer, RENDERER_ELEMENT};
use crate::xml::{
    child_text, find_by_path, find_child, find_child_mut, get_text, replace_child, set_child_text,
    Element,
};

use super::properties::{get_property, properties, remove_property, set_property, CUSTOM_PROPERTIES};

/// A layer in the project registry, backed by its `<maplayer>` element.
///
/// Cloning a `MapLayer` deep-copies the element; clones never share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLayer {
    element: Element,
}

impl MapLayer {
    /// Wrap a `<maplayer>` element.
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// The underlying element.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Consume the layer, returning its element.
    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }

    /// Layer id, empty if the layer has none.
    #[must_use]
    pub fn id(&self) -> String {
        child_text(&self.element, "id").unwrap_or_default()
    }

    pub fn set_id(&mut self, id: &str) {
        set_child_text(&mut self.element, "id", id);
    }

    /// Layer name as shown in the legend.
    #[must_use]
    pub fn name(&self) -> String {
        child_text(&self.element, "layername").unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) {
        set_child_text(&mut self.element, "layername", name);
    }

    /// Title, if set.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        child_text(&self.element, "title")
    }

    pub fn set_title(&mut self, title: &str) {
        set_child_text(&mut self.element, "title", title);
    }

    /// Short name used by OGC services, if set.
    #[must_use]
    pub fn short_name(&self) -> Option<String> {
        child_text(&self.element, "shortname")
    }

    pub fn set_short_name(&mut self, short_name: &str) {
        set_child_text(&mut self.element, "shortname", short_name);
    }

    /// Coordinate reference system (`<srs>`).
    #[must_use]
    pub fn crs(&self) -> Option<&Element> {
        find_child(&self.element, "srs")
    }

    /// Authority id of the layer CRS, e.g. `EPSG:28992`.
    #[must_use]
    pub fn crs_authid(&self) -> Option<String> {
        find_by_path(&self.element, "srs/spatialrefsys/authid")
            .map(get_text)
            .filter(|authid| !authid.is_empty())
    }

    /// Replace the coordinate reference system.
    ///
    /// `crs` must be an `<srs>` element.
    pub fn set_crs(&mut self, crs: Element) {
        replace_child(&mut self.element, crs);
    }

    /// Data source string.
    #[must_use]
    pub fn source(&self) -> String {
        child_text(&self.element, "datasource").unwrap_or_default()
    }

    /// Data provider key (`ogr`, `postgres`, ...), if recorded.
    #[must_use]
    pub fn provider(&self) -> Option<String> {
        child_text(&self.element, "provider")
    }

    /// A layer without an id cannot be placed in the layer tree.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id().is_empty()
    }

    /// Read a custom property.
    #[must_use]
    pub fn custom_property(&self, key: &str) -> Option<&str> {
        get_property(find_child(&self.element, CUSTOM_PROPERTIES)?, key)
    }

    /// Read a custom property, falling back to `default`.
    #[must_use]
    pub fn custom_property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.custom_property(key).unwrap_or(default)
    }

    /// All custom properties in document order.
    #[must_use]
    pub fn custom_properties(&self) -> Vec<(String, String)> {
        find_child(&self.element, CUSTOM_PROPERTIES)
            .map(properties)
            .unwrap_or_default()
    }

    /// Set a custom property, creating `<customproperties>` if needed.
    pub fn set_custom_property(&mut self, key: &str, value: &str) {
        if find_child(&self.element, CUSTOM_PROPERTIES).is_none() {
            self.element.push_element(Element::new(CUSTOM_PROPERTIES));
        }
        if let Some(bag) = find_child_mut(&mut self.element, CUSTOM_PROPERTIES) {
            set_property(bag, key, value);
        }
    }

    /// Remove a custom property. Returns whether it was present.
    pub fn remove_custom_property(&mut self, key: &str) -> bool {
        find_child_mut(&mut self.element, CUSTOM_PROPERTIES)
            .is_some_and(|bag| remove_property(bag, key))
    }

    /// The layer's renderer.
    #[must_use]
    pub fn renderer(&self) -> Renderer {
        Renderer::from_layer_element(&self.element)
    }

    /// Replace the layer's renderer.
    ///
    /// A renderer without an element (`Renderer::Other(None)`) removes
    /// `<renderer-v2>` from the layer.
    pub fn set_renderer(&mut self, renderer: &Renderer) {
        match renderer.to_element() {
            Some(element) => replace_child(&mut self.element, element),
            None => self.element.retain_elements(|e| e.name() != RENDERER_ELEMENT),
        }
    }

    /// Deep copy of this layer with a fresh id.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.set_id(&generate_layer_id(&self.name()));
        copy
    }
}
