//! Project documents (`.qgs` files).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CategorizerError, Result};
use crate::xml::{self, find_child, find_child_mut, get_text, replace_child, Element, XmlDocument};

use super::layer::MapLayer;
use super::tree::{LayerTree, LayerTreeMut, GROUP_ELEMENT};

/// Root element of every project file.
pub const PROJECT_ROOT: &str = "qgis";

const PROJECT_LAYERS: &str = "projectlayers";
const MAP_LAYER: &str = "maplayer";
const CUSTOM_ORDER: &str = "custom-order";

/// A loaded QGIS project.
///
/// The layer registry and the layer tree are lifted out of the XML on load
/// and put back on save. Everything else in the file is kept as parsed and
/// written back unchanged.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    path: Option<PathBuf>,
    document: XmlDocument,
    tree: Element,
    layers: Vec<MapLayer>,
}

impl ProjectDocument {
    /// Load a project from a file.
    ///
    /// # Arguments
    /// * `path` - Path to a `.qgs` file
    ///
    /// # Returns
    /// The project, remembering `path` as its backing file
    ///
    /// # Errors
    /// `Read` if the file cannot be read, `Parse` if it is not well-formed
    /// XML, `MissingElement` if it is not a QGIS project.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CategorizerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = XmlDocument::parse(&text).map_err(|source| CategorizerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut project = Self::from_document(document, &path.display().to_string())?;
        project.path = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            layers = project.layers.len(),
            "Loaded project"
        );
        Ok(project)
    }

    /// Parse a project from XML text. The result has no backing file.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_document(XmlDocument::parse(text)?, "project text")
    }

    fn from_document(mut document: XmlDocument, context: &str) -> Result<Self> {
        if document.root.name() != PROJECT_ROOT {
            return Err(CategorizerError::MissingElement {
                element: PROJECT_ROOT.to_string(),
                context: context.to_string(),
            });
        }

        // Leave an empty placeholder so the tree is written back in place.
        let tree = find_child_mut(&mut document.root, GROUP_ELEMENT)
            .map(|root| std::mem::replace(root, Element::new(GROUP_ELEMENT)))
            .ok_or_else(|| CategorizerError::MissingElement {
                element: GROUP_ELEMENT.to_string(),
                context: context.to_string(),
            })?;

        let mut layers = Vec::new();
        if let Some(registry) = find_child_mut(&mut document.root, PROJECT_LAYERS) {
            layers = registry
                .elements()
                .filter(|e| e.name() == MAP_LAYER)
                .cloned()
                .map(MapLayer::from_element)
                .collect();
            registry.retain_elements(|e| e.name() != MAP_LAYER);
        }

        Ok(Self {
            path: None,
            document,
            tree,
            layers,
        })
    }

    /// Backing file, if the project was loaded from or saved to one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the project back to its backing file.
    ///
    /// # Errors
    /// `NoBackingPath` if the project has never been loaded from or saved
    /// to a file, otherwise any write error.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_deref().ok_or(CategorizerError::NoBackingPath)?;
        xml::save_atomic(&self.to_document(), path)
    }

    /// Write the project to `path` and make it the backing file.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        xml::save_atomic(&self.to_document(), path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Serialize the project.
    pub fn to_xml_string(&self) -> Result<String> {
        xml::to_xml_string(&self.to_document())
    }

    fn to_document(&self) -> XmlDocument {
        let mut document = self.document.clone();
        replace_child(&mut document.root, self.tree.clone());

        if find_child(&document.root, PROJECT_LAYERS).is_none() {
            document.root.push_element(Element::new(PROJECT_LAYERS));
        }
        if let Some(registry) = find_child_mut(&mut document.root, PROJECT_LAYERS) {
            for layer in &self.layers {
                registry.push_element(layer.element().clone());
            }
        }
        document
    }

    /// The layer tree root.
    #[must_use]
    pub fn layer_tree(&self) -> LayerTree<'_> {
        LayerTree::new(&self.tree)
    }

    /// The layer tree root, for editing.
    pub fn layer_tree_mut(&mut self) -> LayerTreeMut<'_> {
        LayerTreeMut::new(&mut self.tree)
    }

    /// Every layer in the registry, in registry order.
    #[must_use]
    pub fn all_layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn all_layers_mut(&mut self) -> &mut [MapLayer] {
        &mut self.layers
    }

    /// First registry layer with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    /// Registry layer with the given id.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    /// Add a layer to the registry without placing it in the tree.
    pub fn add_layer(&mut self, layer: MapLayer) {
        self.layers.push(layer);
    }

    /// Remove a layer from the registry, the layer tree and any custom
    /// rendering order.
    ///
    /// Returns the removed layer, or `None` if no layer has that id.
    pub fn remove_layer(&mut self, id: &str) -> Option<MapLayer> {
        self.layer_tree_mut().remove_layer(id);
        self.replace_in_layer_order(id, &[]);
        let position = self.layers.iter().position(|layer| layer.id() == id)?;
        Some(self.layers.remove(position))
    }

    /// Replace `id` in the custom rendering order with `replacements`.
    ///
    /// Handles `<layerorder><layer id=".."/>` and the `<custom-order>` item
    /// list, which QGIS 3 writes inside the layer tree root (older projects
    /// keep it under `<layer-tree-canvas>`). The replacements take the slot of
    /// the original, in the given order. An empty slice removes the id.
    pub fn replace_in_layer_order(&mut self, id: &str, replacements: &[String]) {
        if let Some(order) = find_child_mut(&mut self.document.root, "layerorder") {
            splice_matching(order, |e| e.name() == "layer" && e.attribute("id") == Some(id), || {
                replacements
                    .iter()
                    .map(|new_id| Element::new("layer").with_attribute("id", new_id.as_str()))
                    .collect()
            });
        }

        let canvas_order = find_child_mut(&mut self.document.root, "layer-tree-canvas")
            .and_then(|canvas| find_child_mut(canvas, CUSTOM_ORDER));
        let tree_order = find_child_mut(&mut self.tree, CUSTOM_ORDER);
        for order in [canvas_order, tree_order].into_iter().flatten() {
            splice_matching(order, |e| e.name() == "item" && get_text(e) == id, || {
                replacements
                    .iter()
                    .map(|new_id| Element::new("item").with_text(new_id.as_str()))
                    .collect()
            });
        }
    }
}

/// Replace every child matching `is_target` with the elements from `make`.
fn splice_matching(
    parent: &mut Element,
    is_target: impl Fn(&Element) -> bool,
    make: impl Fn() -> Vec<Element>,
) {
    let children = std::mem::take(parent.children_mut());
    for node in children {
        if node.as_element().is_some_and(|element| is_target(element)) {
            for replacement in make() {
                parent.push_element(replacement);
            }
        } else {
            parent.children_mut().push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const PROJECT_XML: &str = r#"<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>
<qgis version="3.34.4-Prizren" projectname="Test">
  <title>Test</title>
  <layer-tree-group>
    <customproperties/>
    <layer-tree-layer id="roads_1" name="Roads" source="roads.shp" providerKey="ogr"/>
    <layer-tree-layer id="water_1" name="Water" source="water.shp" providerKey="ogr"/>
  </layer-tree-group>
  <layer-tree-canvas>
    <custom-order enabled="1">
      <item>water_1</item>
      <item>roads_1</item>
    </custom-order>
  </layer-tree-canvas>
  <projectlayers>
    <maplayer type="vector">
      <id>roads_1</id>
      <datasource>roads.shp</datasource>
      <layername>Roads</layername>
    </maplayer>
    <maplayer type="vector">
      <id>water_1</id>
      <datasource>water.shp</datasource>
      <layername>Water</layername>
    </maplayer>
  </projectlayers>
  <layerorder>
    <layer id="roads_1"/>
    <layer id="water_1"/>
  </layerorder>
</qgis>
"#;

    fn project() -> ProjectDocument {
        ProjectDocument::parse(PROJECT_XML).unwrap()
    }

    #[test]
    fn test_parse_lifts_registry_and_tree() {
        let project = project();
        assert_eq!(project.all_layers().len(), 2);
        assert_eq!(project.layer_tree().top_level_names(), vec!["Roads", "Water"]);
        assert_eq!(project.find_by_name("Water").map(MapLayer::id).as_deref(), Some("water_1"));
        assert!(project.layer("roads_1").is_some());
        assert!(project.path().is_none());
    }

    #[test]
    fn test_round_trip_is_stable() {
        let first = project().to_xml_string().unwrap();
        let second = ProjectDocument::parse(&first).unwrap().to_xml_string().unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>"));
        // The tree is written back where it was, before the registry.
        let tree_pos = first.find("<layer-tree-group>").unwrap();
        let registry_pos = first.find("<projectlayers>").unwrap();
        assert!(tree_pos < registry_pos);
    }

    #[test]
    fn test_rejects_non_project_root() {
        let err = ProjectDocument::parse("<html/>").unwrap_err();
        assert!(matches!(err, CategorizerError::MissingElement { .. }));
        assert!(err.is_load_error());
    }

    #[test]
    fn test_rejects_missing_layer_tree() {
        let err = ProjectDocument::parse("<qgis><projectlayers/></qgis>").unwrap_err();
        assert!(matches!(err, CategorizerError::MissingElement { ref element, .. } if element == GROUP_ELEMENT));
    }

    #[test]
    fn test_remove_layer_everywhere() {
        let mut project = project();
        let removed = project.remove_layer("roads_1").unwrap();
        assert_eq!(removed.name(), "Roads");
        assert!(project.layer("roads_1").is_none());
        assert!(project.layer_tree().find_layer("roads_1").is_none());

        let xml = project.to_xml_string().unwrap();
        assert!(!xml.contains("roads_1"));
        assert!(project.remove_layer("roads_1").is_none());
    }

    #[test]
    fn test_replace_in_layer_order_keeps_slot() {
        let mut project = project();
        project.replace_in_layer_order("roads_1", &["a".to_string(), "b".to_string()]);
        let xml = project.to_xml_string().unwrap();

        let a = xml.find(r#"<layer id="a"/>"#).unwrap();
        let b = xml.find(r#"<layer id="b"/>"#).unwrap();
        let water = xml.find(r#"<layer id="water_1"/>"#).unwrap();
        assert!(a < b && b < water);

        let item_water = xml.find("<item>water_1</item>").unwrap();
        let item_a = xml.find("<item>a</item>").unwrap();
        assert!(item_water < item_a);
    }

    #[test]
    fn test_replace_in_custom_order_under_tree_root() {
        let xml = r#"<qgis>
  <layer-tree-group>
    <layer-tree-layer id="lu_1" name="Land use"/>
    <layer-tree-layer id="a_1" name="Roads"/>
    <custom-order enabled="1">
      <item>lu_1</item>
      <item>a_1</item>
    </custom-order>
  </layer-tree-group>
  <projectlayers/>
</qgis>"#;
        let mut project = ProjectDocument::parse(xml).unwrap();
        project.replace_in_layer_order("lu_1", &["urban_1".to_string(), "rural_1".to_string()]);
        let xml = project.to_xml_string().unwrap();

        assert!(!xml.contains("<item>lu_1</item>"));
        let urban = xml.find("<item>urban_1</item>").unwrap();
        let rural = xml.find("<item>rural_1</item>").unwrap();
        let roads = xml.find("<item>a_1</item>").unwrap();
        assert!(urban < rural && rural < roads);
        assert_eq!(project.layer_tree().top_level_names(), vec!["Land use", "Roads"]);
    }

    #[test]
    fn test_save_requires_backing_path() {
        let err = project().save().unwrap_err();
        assert!(matches!(err, CategorizerError::NoBackingPath));
    }

    #[test]
    fn test_save_as_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.qgs");

        let mut project = project();
        project.save_as(&path).unwrap();
        assert_eq!(project.path(), Some(path.as_path()));

        let loaded = ProjectDocument::load(&path).unwrap();
        assert_eq!(loaded.all_layers(), project.all_layers());
        loaded.save().unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ProjectDocument::load(&dir.path().join("missing.qgs")).unwrap_err();
        assert!(matches!(err, CategorizerError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.qgs");
        fs::write(&path, "<qgis><projectlayers></qgis>").unwrap();
        let err = ProjectDocument::load(&path).unwrap_err();
        assert!(matches!(err, CategorizerError::Parse { .. }));
    }
}
