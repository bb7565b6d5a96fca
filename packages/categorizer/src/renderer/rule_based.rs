//! Rule-based renderer (`type="RuleRenderer"`).

use std::collections::HashMap;

use crate::xml::{find_child, find_child_mut, find_children, Element};

use super::{symbol_by_name, ClassItem, RENDERER_ELEMENT};

/// Renderer type name QGIS writes for rule-based renderers.
pub const RULE_BASED_TYPE: &str = "RuleRenderer";

/// Filter value QGIS uses for catch-all rules.
pub const ELSE_FILTER: &str = "ELSE";

/// A single `<rule>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    element: Element,
}

impl Rule {
    /// Create a rule with a fresh key.
    ///
    /// # Arguments
    /// * `filter` - Filter expression, or `ELSE`
    /// * `label` - Legend label
    /// * `symbol` - Name of the symbol in the renderer's `<symbols>`
    /// * `active` - Whether the rule is checked in the legend
    #[must_use]
    pub fn new(filter: &str, label: &str, symbol: Option<&str>, active: bool) -> Self {
        let mut element = Element::new("rule").with_attribute("key", new_rule_key());
        if !filter.is_empty() {
            element.set_attribute("filter", filter);
        }
        if let Some(symbol) = symbol {
            element.set_attribute("symbol", symbol);
        }
        element.set_attribute("label", label);
        if !active {
            element.set_attribute("checkstate", "0");
        }
        Self { element }
    }

    /// Wrap an existing `<rule>` element.
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// Legend label, empty if the rule has none.
    #[must_use]
    pub fn label(&self) -> &str {
        self.element.attribute("label").unwrap_or_default()
    }

    /// Filter expression, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.element.attribute("filter")
    }

    /// Symbol name referenced by this rule.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.element.attribute("symbol")
    }

    /// Whether the rule is checked (`checkstate` absent or non-zero).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.element.attribute("checkstate") != Some("0")
    }

    /// Whether this is a catch-all rule.
    #[must_use]
    pub fn is_else(&self) -> bool {
        self.filter()
            .is_some_and(|f| f.trim().eq_ignore_ascii_case(ELSE_FILTER))
    }

    /// Nested rules.
    #[must_use]
    pub fn children(&self) -> Vec<Rule> {
        find_children(&self.element, "rule")
            .cloned()
            .map(Rule::from_element)
            .collect()
    }

    /// The underlying element.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Consume the rule, returning its element.
    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }
}

/// A rule-based renderer backed by its `<renderer-v2>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBasedRenderer {
    element: Element,
}

impl RuleBasedRenderer {
    /// Wrap a `<renderer-v2 type="RuleRenderer">` element.
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// Assemble a renderer from generated rules and their symbols.
    ///
    /// # Arguments
    /// * `attributes` - Renderer-level attributes to carry over (besides `type`)
    /// * `rules` - Top-level rules, in legend order
    /// * `symbols` - `<symbol>` elements referenced by the rules
    /// * `extra` - Other renderer children to carry over (order-by, effects, ...)
    #[must_use]
    pub fn from_parts(
        attributes: &[(String, String)],
        rules: Vec<Rule>,
        symbols: Vec<Element>,
        extra: Vec<Element>,
    ) -> Self {
        let mut element = Element::new(RENDERER_ELEMENT).with_attribute("type", RULE_BASED_TYPE);
        for (key, value) in attributes {
            element.set_attribute(key.as_str(), value.as_str());
        }

        let mut root = Element::new("rules").with_attribute("key", new_rule_key());
        for rule in rules {
            root.push_element(rule.into_element());
        }
        element.push_element(root);

        let mut symbols_element = Element::new("symbols");
        for symbol in symbols {
            symbols_element.push_element(symbol);
        }
        element.push_element(symbols_element);

        for child in extra {
            element.push_element(child);
        }

        Self { element }
    }

    /// Top-level rules: the children of the root rule.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        find_child(&self.element, "rules")
            .map(|root| {
                find_children(root, "rule")
                    .cloned()
                    .map(Rule::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One classification item per top-level rule.
    #[must_use]
    pub fn classification_items(&self) -> Vec<ClassItem> {
        self.rules()
            .iter()
            .map(|rule| ClassItem::new(rule.label()))
            .collect()
    }

    /// Look up a symbol by name.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<&Element> {
        symbol_by_name(&self.element, name)
    }

    /// Remove every top-level rule whose label differs from `label`.
    ///
    /// Symbols are renumbered afterwards so only the ones still referenced
    /// remain. Returns the number of rules left.
    pub fn retain_label(&mut self, label: &str) -> usize {
        let Some(root) = find_child_mut(&mut self.element, "rules") else {
            return 0;
        };
        root.retain_elements(|rule| {
            rule.name() != "rule" || rule.attribute("label").unwrap_or_default() == label
        });
        let remaining = find_children(root, "rule").count();
        self.renumber_symbols();
        remaining
    }

    /// Rebuild `<symbols>` so names follow rule order starting at `0`.
    ///
    /// Matches what QGIS writes: symbols are numbered in depth-first rule
    /// order and unreferenced symbols are dropped.
    pub fn renumber_symbols(&mut self) {
        let old_symbols: HashMap<String, Element> = find_child(&self.element, "symbols")
            .map(|symbols| {
                symbols
                    .elements()
                    .filter_map(|s| Some((s.attribute("name")?.to_string(), s.clone())))
                    .collect()
            })
            .unwrap_or_default();

        let mut new_symbols = Vec::new();
        if let Some(root) = find_child_mut(&mut self.element, "rules") {
            renumber_rules(root, &old_symbols, &mut new_symbols);
        }

        let mut symbols_element = Element::new("symbols");
        for symbol in new_symbols {
            symbols_element.push_element(symbol);
        }
        match find_child_mut(&mut self.element, "symbols") {
            Some(existing) => *existing = symbols_element,
            None => self.element.push_element(symbols_element),
        }
    }

    /// The underlying `<renderer-v2>` element.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Consume the renderer, returning its element.
    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }
}

fn renumber_rules(
    parent: &mut Element,
    old_symbols: &HashMap<String, Element>,
    new_symbols: &mut Vec<Element>,
) {
    for rule in parent.elements_mut().filter(|e| e.name() == "rule") {
        if let Some(name) = rule.attribute("symbol").map(str::to_string) {
            match old_symbols.get(&name) {
                Some(symbol) => {
                    let new_name = new_symbols.len().to_string();
                    let mut symbol = symbol.clone();
                    symbol.set_attribute("name", new_name.as_str());
                    new_symbols.push(symbol);
                    rule.set_attribute("symbol", new_name);
                }
                None => {
                    tracing::debug!(symbol = %name, "Rule references unknown symbol");
                    rule.remove_attribute("symbol");
                }
            }
        }
        renumber_rules(rule, old_symbols, new_symbols);
    }
}

/// Generate a rule key in the `{uuid}` form QGIS uses.
fn new_rule_key() -> String {
    format!("{{{}}}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use pretty_assertions::assert_eq;

    const RULES_XML: &str = r#"<renderer-v2 type="RuleRenderer" symbollevels="0">
  <rules key="{root}">
    <rule key="{a}" filter="&quot;kind&quot; = 'road'" symbol="0" label="Roads"/>
    <rule key="{b}" label="Water">
      <rule key="{b1}" filter="&quot;kind&quot; = 'lake'" symbol="1" label="Lakes"/>
      <rule key="{b2}" filter="&quot;kind&quot; = 'river'" symbol="2" label="Rivers"/>
    </rule>
    <rule key="{c}" filter="ELSE" symbol="3" label="Other" checkstate="0"/>
  </rules>
  <symbols>
    <symbol name="0" type="line"/>
    <symbol name="1" type="fill"/>
    <symbol name="2" type="line"/>
    <symbol name="3" type="fill"/>
  </symbols>
</renderer-v2>"#;

    fn renderer() -> RuleBasedRenderer {
        RuleBasedRenderer::from_element(XmlDocument::parse(RULES_XML).unwrap().root)
    }

    #[test]
    fn test_classification_items_are_top_level_rules() {
        let labels: Vec<String> = renderer()
            .classification_items()
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, vec!["Roads", "Water", "Other"]);
    }

    #[test]
    fn test_rule_accessors() {
        let rules = renderer().rules();
        assert!(rules[0].is_active());
        assert_eq!(rules[0].symbol(), Some("0"));
        assert_eq!(rules[1].children().len(), 2);
        assert!(rules[2].is_else());
        assert!(!rules[2].is_active());
    }

    #[test]
    fn test_retain_label_keeps_nested_rules_and_symbols() {
        let mut renderer = renderer();
        assert_eq!(renderer.retain_label("Water"), 1);

        let rules = renderer.rules();
        assert_eq!(rules.len(), 1);
        let children = rules[0].children();
        assert_eq!(children[0].symbol(), Some("0"));
        assert_eq!(children[1].symbol(), Some("1"));
        assert_eq!(renderer.symbol("0").and_then(|s| s.attribute("type")), Some("fill"));
        assert_eq!(renderer.symbol("1").and_then(|s| s.attribute("type")), Some("line"));
        assert!(renderer.symbol("2").is_none());
    }

    #[test]
    fn test_retain_unknown_label_removes_all_rules() {
        let mut renderer = renderer();
        assert_eq!(renderer.retain_label("Missing"), 0);
        assert!(renderer.rules().is_empty());
        assert!(renderer.symbol("0").is_none());
    }

    #[test]
    fn test_new_rule_attributes() {
        let rule = Rule::new("\"kind\" = 'road'", "Roads", Some("0"), false);
        assert!(rule.element().attribute("key").is_some_and(|k| k.starts_with('{')));
        assert_eq!(rule.label(), "Roads");
        assert!(!rule.is_active());
        assert!(!rule.is_else());
    }

    #[test]
    fn test_from_parts_layout() {
        let renderer = RuleBasedRenderer::from_parts(
            &[("symbollevels".to_string(), "0".to_string())],
            vec![Rule::new("ELSE", "Rest", Some("0"), true)],
            vec![Element::new("symbol").with_attribute("name", "0")],
            vec![Element::new("orderby")],
        );
        let names: Vec<&str> = renderer.element().elements().map(Element::name).collect();
        assert_eq!(names, vec!["rules", "symbols", "orderby"]);
        assert_eq!(renderer.element().attribute("type"), Some(RULE_BASED_TYPE));
        assert_eq!(renderer.rules()[0].label(), "Rest");
    }
}
