//! Graduated renderer (`type="graduatedSymbol"`).

use crate::xml::{find_child, find_children, Element};

use super::expression::{class_attribute_ref, format_boundary};
use super::rule_based::{Rule, RuleBasedRenderer};
use super::{carried_attributes, carried_children, symbol_by_name, ClassItem};

/// Renderer type name QGIS writes for graduated renderers.
pub const GRADUATED_TYPE: &str = "graduatedSymbol";

/// One `<range>` (legend item) of a graduated renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
    pub symbol: Option<String>,
    pub render: bool,
}

impl Range {
    fn from_element(element: &Element) -> Self {
        let bound = |key: &str| {
            parse_bound(element, key).unwrap_or_else(|| {
                tracing::warn!(
                    range = element.attribute("label").unwrap_or_default(),
                    bound = key,
                    value = element.attribute(key).unwrap_or_default(),
                    "Range bound missing or not a number, using 0"
                );
                0.0
            })
        };
        Self {
            lower: bound("lower"),
            upper: bound("upper"),
            label: element.attribute("label").unwrap_or_default().to_string(),
            symbol: element.attribute("symbol").map(str::to_string),
            render: element.attribute("render") != Some("false"),
        }
    }

    /// Filter expression selecting this range.
    ///
    /// Ranges are exclusive at the lower bound except for the first one,
    /// so adjacent classes never overlap.
    #[must_use]
    pub fn filter(&self, attribute_ref: &str, first: bool) -> String {
        let lower_op = if first { ">=" } else { ">" };
        format!(
            "{attribute_ref} {lower_op} {} AND {attribute_ref} <= {}",
            format_boundary(self.lower),
            format_boundary(self.upper)
        )
    }
}

/// Parse the `lower` or `upper` attribute of a `<range>`.
fn parse_bound(element: &Element, key: &str) -> Option<f64> {
    element.attribute(key)?.trim().parse().ok()
}

/// A graduated renderer backed by its `<renderer-v2>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraduatedRenderer {
    element: Element,
}

impl GraduatedRenderer {
    /// Wrap a `<renderer-v2 type="graduatedSymbol">` element.
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// Classification attribute (field name or expression).
    #[must_use]
    pub fn attribute(&self) -> &str {
        self.element.attribute("attr").unwrap_or_default()
    }

    /// Legend items in order.
    #[must_use]
    pub fn ranges(&self) -> Vec<Range> {
        find_child(&self.element, "ranges")
            .map(|ranges| find_children(ranges, "range").map(Range::from_element).collect())
            .unwrap_or_default()
    }

    /// One classification item per legend item.
    #[must_use]
    pub fn classification_items(&self) -> Vec<ClassItem> {
        self.ranges()
            .into_iter()
            .map(|range| ClassItem::new(range.label))
            .collect()
    }

    /// Convert to an equivalent rule-based renderer, one rule per range.
    #[must_use]
    pub fn to_rule_based(&self) -> RuleBasedRenderer {
        let attribute_ref = class_attribute_ref(self.attribute());
        let mut rules = Vec::new();
        let mut symbols = Vec::new();

        for (index, range) in self.ranges().iter().enumerate() {
            let symbol = range
                .symbol
                .as_deref()
                .and_then(|name| symbol_by_name(&self.element, name))
                .map(|symbol| {
                    let name = symbols.len().to_string();
                    symbols.push(symbol.clone().with_attribute("name", name.as_str()));
                    name
                });
            rules.push(Rule::new(
                &range.filter(&attribute_ref, index == 0),
                &range.label,
                symbol.as_deref(),
                range.render,
            ));
        }

        RuleBasedRenderer::from_parts(
            &carried_attributes(&self.element),
            rules,
            symbols,
            carried_children(&self.element),
        )
    }

    /// The underlying `<renderer-v2>` element.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }
}
