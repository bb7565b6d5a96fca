//! Categorized renderer (`type="categorizedSymbol"`).

use crate::xml::{find_child, find_children, Element};

use super::expression::{class_attribute_ref, quoted_value};
use super::rule_based::{Rule, RuleBasedRenderer, ELSE_FILTER};
use super::{carried_attributes, carried_children, symbol_by_name, ClassItem};

/// Renderer type name QGIS writes for categorized renderers.
pub const CATEGORIZED_TYPE: &str = "categorizedSymbol";

/// A single value a category matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryValue {
    /// Value as written in the project.
    pub value: String,
    /// QVariant type name, if recorded (e.g. `QString`, `int`).
    pub value_type: Option<String>,
}

impl CategoryValue {
    fn from_element(element: &Element) -> Self {
        Self {
            value: element.attribute("value").unwrap_or_default().to_string(),
            value_type: element.attribute("type").map(str::to_string),
        }
    }

    fn quoted(&self) -> String {
        quoted_value(&self.value, self.value_type.as_deref())
    }
}

/// One `<category>` of a categorized renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Matched value, or several values for list categories.
    pub values: Vec<CategoryValue>,
    /// Whether the category stores a value list (`<val>` children).
    pub is_list: bool,
    /// Legend label.
    pub label: String,
    /// Symbol name in the renderer's `<symbols>`.
    pub symbol: Option<String>,
    /// Whether the category is rendered.
    pub render: bool,
}

impl Category {
    fn from_element(element: &Element) -> Self {
        let list: Vec<CategoryValue> = find_children(element, "val")
            .map(CategoryValue::from_element)
            .collect();
        let is_list = !list.is_empty();
        let values = if is_list {
            list
        } else {
            vec![CategoryValue::from_element(element)]
        };

        Self {
            values,
            is_list,
            label: element.attribute("label").unwrap_or_default().to_string(),
            symbol: element.attribute("symbol").map(str::to_string),
            render: element.attribute("render") != Some("false"),
        }
    }

    /// Filter expression selecting this category.
    ///
    /// A category with an empty value is the catch-all `ELSE` rule.
    #[must_use]
    pub fn filter(&self, attribute_ref: &str) -> String {
        if self.is_list {
            let values: Vec<String> = self.values.iter().map(CategoryValue::quoted).collect();
            return format!("{attribute_ref} IN ({})", values.join(","));
        }

        match self.values.first() {
            Some(value) if !value.value.is_empty() => {
                format!("{attribute_ref} = {}", value.quoted())
            }
            _ => ELSE_FILTER.to_string(),
        }
    }
}

/// A categorized renderer backed by its `<renderer-v2>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedRenderer {
    element: Element,
}

impl CategorizedRenderer {
    /// Wrap a `<renderer-v2 type="categorizedSymbol">` element.
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// Classification attribute (field name or expression).
    #[must_use]
    pub fn attribute(&self) -> &str {
        self.element.attribute("attr").unwrap_or_default()
    }

    /// Categories in legend order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        find_child(&self.element, "categories")
            .map(|categories| {
                find_children(categories, "category")
                    .map(Category::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One classification item per category.
    #[must_use]
    pub fn classification_items(&self) -> Vec<ClassItem> {
        self.categories()
            .into_iter()
            .map(|category| ClassItem::new(category.label))
            .collect()
    }

    /// Convert to an equivalent rule-based renderer, one rule per category.
    #[must_use]
    pub fn to_rule_based(&self) -> RuleBasedRenderer {
        let attribute_ref = class_attribute_ref(self.attribute());
        let mut rules = Vec::new();
        let mut symbols = Vec::new();

        for category in self.categories() {
            let symbol = category
                .symbol
                .as_deref()
                .and_then(|name| symbol_by_name(&self.element, name))
                .map(|symbol| {
                    let name = symbols.len().to_string();
                    symbols.push(symbol.clone().with_attribute("name", name.as_str()));
                    name
                });
            rules.push(Rule::new(
                &category.filter(&attribute_ref),
                &category.label,
                symbol.as_deref(),
                category.render,
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
