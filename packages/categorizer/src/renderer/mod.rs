//! Layer renderers and classification dispatch.
//!
//! A layer's `<renderer-v2>` element is parsed into a closed [`Renderer`]
//! enum. Every variant answers one question, [`Renderer::classification_items`]:
//! which classes does this renderer draw? Categorized, graduated and
//! rule-based renderers can also be converted to a rule-based renderer,
//! which is how a split layer is narrowed to a single class.

mod categorized;
mod expression;
mod graduated;
mod rule_based;

use serde::Serialize;

use crate::xml::{find_child, Element};

pub use categorized::{CategorizedRenderer, Category, CategoryValue, CATEGORIZED_TYPE};
pub use expression::{
    class_attribute_ref, format_boundary, quoted_column_ref, quoted_string, quoted_value,
};
pub use graduated::{GraduatedRenderer, Range, GRADUATED_TYPE};
pub use rule_based::{Rule, RuleBasedRenderer, ELSE_FILTER, RULE_BASED_TYPE};

/// Tag name of the renderer element inside `<maplayer>`.
pub const RENDERER_ELEMENT: &str = "renderer-v2";

/// Renderer-level attributes kept when converting to rule-based.
const CARRIED_ATTRIBUTES: &[&str] = &["symbollevels", "forceraster", "enableorderby", "referencescale"];

/// Renderer children kept when converting to rule-based.
const CARRIED_CHILDREN: &[&str] = &["orderby", "effect", "data-defined-properties"];

/// Renderer variant, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RendererKind {
    Categorized,
    Graduated,
    RuleBased,
    Other,
}

impl RendererKind {
    /// Get the string value used in reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categorized => "categorized",
            Self::Graduated => "graduated",
            Self::RuleBased => "rule-based",
            Self::Other => "other",
        }
    }
}

/// One class a renderer draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassItem {
    /// Legend label, also used as the name of the split layer.
    pub label: String,
}

impl ClassItem {
    /// Create a class item.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A layer renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderer {
    Categorized(CategorizedRenderer),
    Graduated(GraduatedRenderer),
    RuleBased(RuleBasedRenderer),
    /// Any other renderer (single symbol, heatmap, raster, or none at all).
    Other(Option<Element>),
}

impl Renderer {
    /// Parse a `<renderer-v2>` element.
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        match element.attribute("type") {
            Some(CATEGORIZED_TYPE) => {
                Self::Categorized(CategorizedRenderer::from_element(element.clone()))
            }
            Some(GRADUATED_TYPE) => Self::Graduated(GraduatedRenderer::from_element(element.clone())),
            Some(RULE_BASED_TYPE) => Self::RuleBased(RuleBasedRenderer::from_element(element.clone())),
            _ => Self::Other(Some(element.clone())),
        }
    }

    /// Parse the renderer of a `<maplayer>` element.
    #[must_use]
    pub fn from_layer_element(layer: &Element) -> Self {
        find_child(layer, RENDERER_ELEMENT)
            .map(Self::from_element)
            .unwrap_or(Self::Other(None))
    }

    /// The renderer variant.
    #[must_use]
    pub fn kind(&self) -> RendererKind {
        match self {
            Self::Categorized(_) => RendererKind::Categorized,
            Self::Graduated(_) => RendererKind::Graduated,
            Self::RuleBased(_) => RendererKind::RuleBased,
            Self::Other(_) => RendererKind::Other,
        }
    }

    /// Classes drawn by this renderer, in legend order.
    ///
    /// - Categorized: one item per category
    /// - Graduated: one item per legend item (range)
    /// - Rule-based: one item per child of the root rule
    /// - anything else: no items
    #[must_use]
    pub fn classification_items(&self) -> Vec<ClassItem> {
        match self {
            Self::Categorized(renderer) => renderer.classification_items(),
            Self::Graduated(renderer) => renderer.classification_items(),
            Self::RuleBased(renderer) => renderer.classification_items(),
            Self::Other(_) => Vec::new(),
        }
    }

    /// Convert to an equivalent rule-based renderer.
    ///
    /// Returns `None` for renderers without classes.
    #[must_use]
    pub fn to_rule_based(&self) -> Option<RuleBasedRenderer> {
        match self {
            Self::Categorized(renderer) => Some(renderer.to_rule_based()),
            Self::Graduated(renderer) => Some(renderer.to_rule_based()),
            Self::RuleBased(renderer) => Some(renderer.clone()),
            Self::Other(_) => None,
        }
    }

    /// The `<renderer-v2>` element, if the layer has one.
    #[must_use]
    pub fn to_element(&self) -> Option<Element> {
        match self {
            Self::Categorized(renderer) => Some(renderer.element().clone()),
            Self::Graduated(renderer) => Some(renderer.element().clone()),
            Self::RuleBased(renderer) => Some(renderer.element().clone()),
            Self::Other(element) => element.clone(),
        }
    }
}

/// Look up a `<symbol>` by name in a renderer's `<symbols>`.
pub(crate) fn symbol_by_name<'a>(renderer: &'a Element, name: &str) -> Option<&'a Element> {
    find_child(renderer, "symbols")?
        .elements()
        .find(|s| s.name() == "symbol" && s.attribute("name") == Some(name))
}

pub(crate) fn carried_attributes(renderer: &Element) -> Vec<(String, String)> {
    renderer
        .attributes()
        .iter()
        .filter(|(key, _)| CARRIED_ATTRIBUTES.contains(&key.as_str()))
        .cloned()
        .collect()
}

pub(crate) fn carried_children(renderer: &Element) -> Vec<Element> {
    renderer
        .elements()
        .filter(|child| CARRIED_CHILDREN.contains(&child.name()))
        .cloned()
        .collect()
}
