//! Owned, mutable XML tree.
//!
//! `roxmltree` gives a read-only view of a document. Project rewriting needs
//! to insert, clone and remove subtrees, so a parsed document is copied into
//! the [`Element`] tree below and serialized again by [`super::writer`].

use roxmltree::{Document, NodeType, ParsingOptions};

use super::utils::extract_doctype;

/// A node inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Child element.
    Element(Element),
    /// Character data (unescaped).
    Text(String),
    /// Comment body without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Processing instruction.
    ProcessingInstruction {
        target: String,
        value: Option<String>,
    },
}

impl Node {
    /// Return the element if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Return the element mutably if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute (builder style).
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Append a child element (builder style).
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Set the text content (builder style).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Tag name, including a namespace prefix if the source had one.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        let position = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(position).1)
    }

    /// All child nodes.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// All child nodes, mutably.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Child elements in order, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Child elements in order, mutably.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// Append a child element.
    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Keep only the child elements for which `keep` returns true.
    ///
    /// Non-element children are always kept.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|node| match node {
            Node::Element(element) => keep(element),
            _ => true,
        });
    }

    /// Concatenated direct text content, or `None` if there is none.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for node in &self.children {
            if let Node::Text(t) = node {
                text.get_or_insert_with(String::new).push_str(t);
            }
        }
        text
    }

    /// Replace all children with a single text node.
    ///
    /// An empty string leaves the element without children.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Whether the element has any child element.
    #[must_use]
    pub fn has_element_children(&self) -> bool {
        self.children.iter().any(|n| matches!(n, Node::Element(_)))
    }

    /// Copy a parsed `roxmltree` element into an owned tree.
    ///
    /// Whitespace-only text between child elements is dropped; the writer
    /// re-indents the output.
    pub(crate) fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut element = Element::new(qualified_name(node));

        for namespace in declared_namespaces(node) {
            element.attributes.push(namespace);
        }
        for attr in node.attributes() {
            let key = match attr.namespace().and_then(|uri| node.lookup_prefix(uri)) {
                Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", attr.name()),
                _ => attr.name().to_string(),
            };
            element.attributes.push((key, attr.value().to_string()));
        }

        let mixed = node.children().any(|c| c.is_element());
        for child in node.children() {
            if let Some(converted) = convert_node(child, mixed) {
                element.children.push(converted);
            }
        }

        element
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Whether the source started with an XML declaration.
    pub has_declaration: bool,
    /// Doctype body, e.g. `qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'`.
    pub doctype: Option<String>,
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<Node>,
    /// Root element.
    pub root: Element,
}

impl XmlDocument {
    /// Create a document around a root element.
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            has_declaration: false,
            doctype: None,
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse XML text.
    ///
    /// Doctype declarations are allowed, since every QGIS project starts
    /// with one.
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)?;
        let root_element = doc.root_element();

        let prolog = doc
            .root()
            .children()
            .take_while(|n| *n != root_element)
            .filter_map(|n| convert_node(n, true))
            .collect();

        Ok(Self {
            has_declaration: text.trim_start_matches('\u{feff}').trim_start().starts_with("<?xml"),
            doctype: extract_doctype(text),
            prolog,
            root: Element::from_node(root_element),
        })
    }
}

fn convert_node(node: roxmltree::Node<'_, '_>, drop_blank_text: bool) -> Option<Node> {
    match node.node_type() {
        NodeType::Element => Some(Node::Element(Element::from_node(node))),
        NodeType::Text => {
            let text = node.text()?;
            if drop_blank_text && text.trim().is_empty() {
                None
            } else {
                Some(Node::Text(text.to_string()))
            }
        }
        NodeType::Comment => node.text().map(|t| Node::Comment(t.to_string())),
        NodeType::PI => node.pi().map(|pi| Node::ProcessingInstruction {
            target: pi.target.to_string(),
            value: pi.value.map(str::to_string),
        }),
        NodeType::Root => None,
    }
}

fn qualified_name(node: roxmltree::Node<'_, '_>) -> String {
    let tag = node.tag_name();
    match tag.namespace().and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", tag.name()),
        _ => tag.name().to_string(),
    }
}

/// Namespace declarations introduced on this element (not inherited).
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| match ns.name() {
            Some(prefix) => (format!("xmlns:{prefix}"), ns.uri().to_string()),
            None => ("xmlns".to_string(), ns.uri().to_string()),
        })
        .collect()
}
