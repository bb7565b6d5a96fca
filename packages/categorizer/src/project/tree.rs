//! The layer tree (`<layer-tree-group>` under `<qgis>`).
//!
//! The tree orders what the legend shows. Its nodes are groups and layer
//! references; the layers themselves live in the registry. Elements that are
//! not tree nodes (`<customproperties>`, ...) are skipped when enumerating
//! children and kept in place when editing.

use crate::xml::{Element, Node};

use super::layer::MapLayer;
use super::properties::CUSTOM_PROPERTIES;

/// Tag name of group nodes, including the tree root.
pub const GROUP_ELEMENT: &str = "layer-tree-group";

/// Tag name of layer nodes.
pub const LAYER_ELEMENT: &str = "layer-tree-layer";

const CHECKED: &str = "Qt::Checked";

fn is_tree_node(element: &Element) -> bool {
    matches!(element.name(), GROUP_ELEMENT | LAYER_ELEMENT)
}

/// A node of the layer tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerTreeNode<'a> {
    Group(&'a Element),
    Layer(&'a Element),
}

impl<'a> LayerTreeNode<'a> {
    fn from_element(element: &'a Element) -> Option<Self> {
        match element.name() {
            GROUP_ELEMENT => Some(Self::Group(element)),
            LAYER_ELEMENT => Some(Self::Layer(element)),
            _ => None,
        }
    }

    /// Display name of the node.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.element().attribute("name").unwrap_or_default()
    }

    /// Referenced layer id, for layer nodes.
    #[must_use]
    pub fn layer_id(&self) -> Option<&'a str> {
        match self {
            Self::Layer(element) => element.attribute("id"),
            Self::Group(_) => None,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Child nodes of a group; layers have none.
    #[must_use]
    pub fn children(&self) -> Vec<LayerTreeNode<'a>> {
        match self {
            Self::Group(element) => tree_children(element),
            Self::Layer(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn element(&self) -> &'a Element {
        match self {
            Self::Group(element) | Self::Layer(element) => element,
        }
    }
}

fn tree_children(element: &Element) -> Vec<LayerTreeNode<'_>> {
    element.elements().filter_map(LayerTreeNode::from_element).collect()
}

/// Read-only view of the layer tree root.
#[derive(Debug, Clone, Copy)]
pub struct LayerTree<'a> {
    root: &'a Element,
}

impl<'a> LayerTree<'a> {
    pub(crate) fn new(root: &'a Element) -> Self {
        Self { root }
    }

    /// Top-level nodes in legend order.
    #[must_use]
    pub fn children(&self) -> Vec<LayerTreeNode<'a>> {
        tree_children(self.root)
    }

    /// Names of the top-level nodes in legend order.
    ///
    /// This is the ordering a split layer's group is positioned against.
    #[must_use]
    pub fn top_level_names(&self) -> Vec<String> {
        self.children()
            .iter()
            .map(|node| node.name().to_string())
            .collect()
    }

    /// Find the layer node referencing `id`, at any depth.
    #[must_use]
    pub fn find_layer(&self, id: &str) -> Option<LayerTreeNode<'a>> {
        find_layer_in(self.root, id)
    }

    /// Find a group by name, at any depth.
    #[must_use]
    pub fn find_group(&self, name: &str) -> Option<LayerTreeNode<'a>> {
        find_group_in(self.root, name)
    }

    /// Ids of every layer node, depth-first.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        collect_layer_ids(self.root, &mut ids);
        ids
    }
}

fn find_layer_in<'a>(parent: &'a Element, id: &str) -> Option<LayerTreeNode<'a>> {
    tree_children(parent).into_iter().find_map(|node| match node {
        LayerTreeNode::Layer(element) if element.attribute("id") == Some(id) => Some(node),
        LayerTreeNode::Layer(_) => None,
        LayerTreeNode::Group(element) => find_layer_in(element, id),
    })
}

fn find_group_in<'a>(parent: &'a Element, name: &str) -> Option<LayerTreeNode<'a>> {
    tree_children(parent).into_iter().find_map(|node| match node {
        LayerTreeNode::Group(element) if node.name() == name => Some(LayerTreeNode::Group(element)),
        LayerTreeNode::Group(element) => find_group_in(element, name),
        LayerTreeNode::Layer(_) => None,
    })
}

fn collect_layer_ids(parent: &Element, ids: &mut Vec<String>) {
    for node in tree_children(parent) {
        match node {
            LayerTreeNode::Layer(element) => {
                if let Some(id) = element.attribute("id") {
                    ids.push(id.to_string());
                }
            }
            LayerTreeNode::Group(element) => collect_layer_ids(element, ids),
        }
    }
}

/// Mutable view of the layer tree root.
#[derive(Debug)]
pub struct LayerTreeMut<'a> {
    root: &'a mut Element,
}

impl<'a> LayerTreeMut<'a> {
    pub(crate) fn new(root: &'a mut Element) -> Self {
        Self { root }
    }

    /// Read-only view of the same tree.
    #[must_use]
    pub fn as_tree(&self) -> LayerTree<'_> {
        LayerTree::new(self.root)
    }

    /// Insert a group among the top-level nodes.
    ///
    /// `index` counts tree nodes only. An index past the last node appends
    /// the group.
    pub fn insert_group(&mut self, index: usize, group: LayerTreeGroup) {
        let position = self
            .root
            .children()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.as_element().is_some_and(is_tree_node))
            .nth(index)
            .map(|(position, _)| position)
            .unwrap_or(self.root.children().len());
        self.root
            .children_mut()
            .insert(position, Node::Element(group.into_element()));
    }

    /// Remove every layer node referencing `id`, at any depth.
    ///
    /// Returns whether a node was removed.
    pub fn remove_layer(&mut self, id: &str) -> bool {
        remove_layer_in(self.root, id)
    }
}

fn remove_layer_in(parent: &mut Element, id: &str) -> bool {
    let before = parent.children().len();
    parent.retain_elements(|e| !(e.name() == LAYER_ELEMENT && e.attribute("id") == Some(id)));
    let mut removed = parent.children().len() != before;
    for group in parent.elements_mut().filter(|e| e.name() == GROUP_ELEMENT) {
        removed |= remove_layer_in(group, id);
    }
    removed
}

/// A group being assembled outside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerTreeGroup {
    element: Element,
}

impl LayerTreeGroup {
    /// Create an empty, checked and expanded group.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let element = Element::new(GROUP_ELEMENT)
            .with_attribute("name", name)
            .with_attribute("checked", CHECKED)
            .with_attribute("expanded", "1")
            .with_child(Element::new(CUSTOM_PROPERTIES));
        Self { element }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.element.attribute("name").unwrap_or_default()
    }

    /// Append a layer node for `layer` as the last child.
    ///
    /// The node is checked and expanded, like a layer newly added in QGIS.
    pub fn add_layer(&mut self, layer: &MapLayer) {
        let mut node = Element::new(LAYER_ELEMENT)
            .with_attribute("id", layer.id())
            .with_attribute("name", layer.name())
            .with_attribute("source", layer.source());
        if let Some(provider) = layer.provider() {
            node.set_attribute("providerKey", provider);
        }
        node = node
            .with_attribute("checked", CHECKED)
            .with_attribute("expanded", "1")
            .with_child(Element::new(CUSTOM_PROPERTIES));
        self.element.push_element(node);
    }

    /// Layer nodes in the group.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerTreeNode<'_>> {
        tree_children(&self.element)
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use pretty_assertions::assert_eq;

    const TREE_XML: &str = r#"<layer-tree-group>
  <customproperties/>
  <layer-tree-layer id="roads_1" name="Roads" source="roads.shp" providerKey="ogr" checked="Qt::Unchecked" expanded="0">
    <customproperties/>
  </layer-tree-layer>
  <layer-tree-group name="Base" checked="Qt::Checked" expanded="1">
    <customproperties/>
    <layer-tree-layer id="parcels_1" name="Parcels" source="parcels.shp" providerKey="ogr"/>
  </layer-tree-group>
  <layer-tree-layer id="water_1" name="Water" source="water.shp" providerKey="ogr"/>
</layer-tree-group>"#;

    fn root() -> Element {
        XmlDocument::parse(TREE_XML).unwrap().root
    }

    #[test]
    fn test_top_level_names_skip_custom_properties() {
        let root = root();
        let tree = LayerTree::new(&root);
        assert_eq!(tree.top_level_names(), vec!["Roads", "Base", "Water"]);
        assert!(tree.children()[1].is_group());
    }

    #[test]
    fn test_find_layer_at_depth() {
        let root = root();
        let tree = LayerTree::new(&root);
        let node = tree.find_layer("parcels_1").unwrap();
        assert_eq!(node.name(), "Parcels");
        assert!(tree.find_layer("missing").is_none());
        assert_eq!(tree.layer_ids(), vec!["roads_1", "parcels_1", "water_1"]);
        assert_eq!(tree.find_group("Base").unwrap().children().len(), 1);
    }

    #[test]
    fn test_insert_group_counts_tree_nodes_only() {
        let mut root = root();
        LayerTreeMut::new(&mut root).insert_group(1, LayerTreeGroup::new("Roads"));
        let tree = LayerTree::new(&root);
        assert_eq!(tree.top_level_names(), vec!["Roads", "Roads", "Base", "Water"]);
        assert!(tree.children()[1].is_group());
        assert_eq!(root.elements().next().map(Element::name), Some("customproperties"));
    }

    #[test]
    fn test_insert_group_past_end_appends() {
        let mut root = root();
        LayerTreeMut::new(&mut root).insert_group(42, LayerTreeGroup::new("Last"));
        let names = LayerTree::new(&root).top_level_names();
        assert_eq!(names.last().map(String::as_str), Some("Last"));
    }

    #[test]
    fn test_remove_layer_nested() {
        let mut root = root();
        let mut tree = LayerTreeMut::new(&mut root);
        assert!(tree.remove_layer("parcels_1"));
        assert!(!tree.remove_layer("parcels_1"));
        assert!(tree.as_tree().find_layer("parcels_1").is_none());
        assert_eq!(tree.as_tree().top_level_names(), vec!["Roads", "Base", "Water"]);
    }

    #[test]
    fn test_group_add_layer() {
        let layer = MapLayer::from_element(
            Element::new("maplayer")
                .with_child(Element::new("id").with_text("Urban_x"))
                .with_child(Element::new("datasource").with_text("parcels.shp"))
                .with_child(Element::new("layername").with_text("Urban"))
                .with_child(Element::new("provider").with_text("ogr")),
        );

        let mut group = LayerTreeGroup::new("Parcels");
        group.add_layer(&layer);
        group.add_layer(&layer);

        assert_eq!(group.name(), "Parcels");
        let layers = group.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].layer_id(), Some("Urban_x"));
        assert_eq!(layers[0].name(), "Urban");
        let node = layers[1].element();
        assert_eq!(node.attribute("providerKey"), Some("ogr"));
        assert_eq!(node.attribute("source"), Some("parcels.shp"));
        assert_eq!(node.attribute("checked"), Some("Qt::Checked"));
    }
}
