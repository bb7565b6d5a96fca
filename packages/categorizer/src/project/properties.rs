//! Layer custom properties (`<customproperties>`).
//!
//! QGIS has written two encodings over time:
//!
//! ```xml
//! <!-- legacy -->
//! <customproperties>
//!   <property key="convert_categorized_layer" value="true"/>
//! </customproperties>
//!
//! <!-- current -->
//! <customproperties>
//!   <Option type="Map">
//!     <Option type="QString" name="convert_categorized_layer" value="true"/>
//!   </Option>
//! </customproperties>
//! ```
//!
//! Both are read. Writes keep the encoding already in use; an empty bag is
//! written in the current encoding.

use crate::xml::{find_child, find_child_mut, find_children, Element};

/// Tag name of the property bag.
pub const CUSTOM_PROPERTIES: &str = "customproperties";

/// Read a property value.
#[must_use]
pub fn get_property<'a>(bag: &'a Element, key: &str) -> Option<&'a str> {
    if let Some(property) = find_children(bag, "property").find(|p| p.attribute("key") == Some(key)) {
        return property.attribute("value");
    }
    option_map(bag)?
        .elements()
        .find(|o| o.name() == "Option" && o.attribute("name") == Some(key))
        .and_then(|o| o.attribute("value"))
}

/// All properties as key/value pairs, in document order.
#[must_use]
pub fn properties(bag: &Element) -> Vec<(String, String)> {
    let legacy = find_children(bag, "property").filter_map(|p| {
        Some((p.attribute("key")?.to_string(), p.attribute("value")?.to_string()))
    });
    let current = option_map(bag).into_iter().flat_map(|map| {
        map.elements().filter_map(|o| {
            Some((o.attribute("name")?.to_string(), o.attribute("value")?.to_string()))
        })
    });
    legacy.chain(current).collect()
}

/// Set a property, replacing an existing value.
pub fn set_property(bag: &mut Element, key: &str, value: &str) {
    if uses_legacy_encoding(bag) {
        if let Some(property) = bag
            .elements_mut()
            .find(|p| p.name() == "property" && p.attribute("key") == Some(key))
        {
            property.set_attribute("value", value);
            return;
        }
        bag.push_element(
            Element::new("property")
                .with_attribute("key", key)
                .with_attribute("value", value),
        );
        return;
    }

    with_option_map(bag, |map| {
        let option = Element::new("Option")
            .with_attribute("type", "QString")
            .with_attribute("name", key)
            .with_attribute("value", value);
        let existing = map
            .elements_mut()
            .find(|o| o.name() == "Option" && o.attribute("name") == Some(key));
        if let Some(existing) = existing {
            *existing = option;
        } else {
            map.push_element(option);
        }
    });
}

/// Remove a property entirely. Returns whether it was present.
pub fn remove_property(bag: &mut Element, key: &str) -> bool {
    let mut removed = false;
    bag.retain_elements(|p| {
        let matches = p.name() == "property" && p.attribute("key") == Some(key);
        removed |= matches;
        !matches
    });
    if let Some(map) = find_child_mut(bag, "Option") {
        map.retain_elements(|o| {
            let matches = o.name() == "Option" && o.attribute("name") == Some(key);
            removed |= matches;
            !matches
        });
    }
    removed
}

fn uses_legacy_encoding(bag: &Element) -> bool {
    find_child(bag, "property").is_some()
}

fn option_map(bag: &Element) -> Option<&Element> {
    find_child(bag, "Option")
}

/// Run `edit` on the `<Option type="Map">` element, creating it if missing.
fn with_option_map(bag: &mut Element, edit: impl FnOnce(&mut Element)) {
    match find_child_mut(bag, "Option") {
        Some(map) => {
            // QGIS writes an empty map as a bare <Option/>.
            if map.attribute("type").is_none() {
                map.set_attribute("type", "Map");
            }
            edit(map);
        }
        None => {
            let mut map = Element::new("Option").with_attribute("type", "Map");
            edit(&mut map);
            bag.push_element(map);
        }
    }
}
