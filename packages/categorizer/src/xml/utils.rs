//! Helpers for navigating and editing [`Element`] trees.

use super::tree::Element;

/// Find the first child element with the given tag name.
///
/// # Arguments
/// * `element` - Parent element to search in
/// * `tag` - Tag name to search for
///
/// # Returns
/// First matching child element, or `None` if not found
///
/// # Examples
/// ```
/// use qgs_categorizer::xml::{find_child, XmlDocument};
///
/// let doc = XmlDocument::parse("<maplayer><id>a</id><layername>b</layername></maplayer>").unwrap();
/// assert!(find_child(&doc.root, "layername").is_some());
/// assert!(find_child(&doc.root, "missing").is_none());
/// ```
#[must_use]
pub fn find_child<'a>(element: &'a Element, tag: &str) -> Option<&'a Element> {
    element.elements().find(|child| child.name() == tag)
}

/// Find the first child element with the given tag name, mutably.
pub fn find_child_mut<'a>(element: &'a mut Element, tag: &str) -> Option<&'a mut Element> {
    element.elements_mut().find(|child| child.name() == tag)
}

/// Find all child elements with the given tag name.
///
/// # Examples
/// ```
/// use qgs_categorizer::xml::{find_children, XmlDocument};
///
/// let doc = XmlDocument::parse("<ranges><range/><range/><other/></ranges>").unwrap();
/// assert_eq!(find_children(&doc.root, "range").count(), 2);
/// ```
pub fn find_children<'a>(element: &'a Element, tag: &'a str) -> impl Iterator<Item = &'a Element> {
    element.elements().filter(move |child| child.name() == tag)
}

/// Find a descendant element matching a path of tag names.
///
/// # Arguments
/// * `element` - Starting element
/// * `path` - Slash-separated path of tag names (e.g., "srs/spatialrefsys")
///
/// # Examples
/// ```
/// use qgs_categorizer::xml::{find_by_path, XmlDocument};
///
/// let doc = XmlDocument::parse("<maplayer><srs><spatialrefsys><authid>EPSG:28992</authid></spatialrefsys></srs></maplayer>").unwrap();
/// let authid = find_by_path(&doc.root, "srs/spatialrefsys/authid").unwrap();
/// assert_eq!(authid.text().as_deref(), Some("EPSG:28992"));
/// ```
#[must_use]
pub fn find_by_path<'a>(element: &'a Element, path: &str) -> Option<&'a Element> {
    path.split('/')
        .try_fold(element, |current, part| find_child(current, part))
}

/// Get the trimmed text content of an element.
///
/// Returns an empty string when the element has no text.
#[must_use]
pub fn get_text(element: &Element) -> String {
    element
        .text()
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Get the trimmed text of a child element, if present and non-empty.
#[must_use]
pub fn child_text(element: &Element, tag: &str) -> Option<String> {
    find_child(element, tag)
        .map(get_text)
        .filter(|text| !text.is_empty())
}

/// Set the text of a child element, creating the child if needed.
pub fn set_child_text(element: &mut Element, tag: &str, text: &str) {
    match find_child_mut(element, tag) {
        Some(child) => child.set_text(text),
        None => element.push_element(Element::new(tag).with_text(text)),
    }
}

/// Replace the first child element with the given tag, or append it.
pub fn replace_child(element: &mut Element, replacement: Element) {
    let tag = replacement.name().to_string();
    match find_child_mut(element, &tag) {
        Some(child) => *child = replacement,
        None => element.push_element(replacement),
    }
}

/// Extract the body of a `<!DOCTYPE ...>` declaration from raw XML text.
///
/// `roxmltree` validates the doctype but does not expose it, so it is
/// recovered from the source text to be written back unchanged.
///
/// # Examples
/// ```
/// use qgs_categorizer::xml::extract_doctype;
///
/// let xml = "<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>\n<qgis/>";
/// assert_eq!(
///     extract_doctype(xml).as_deref(),
///     Some("qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'")
/// );
/// assert_eq!(extract_doctype("<qgis/>"), None);
/// ```
#[must_use]
pub fn extract_doctype(text: &str) -> Option<String> {
    const OPEN: &str = "<!DOCTYPE";

    let start = text.find(OPEN)?;
    // The doctype must come before the root element.
    let first_element = text
        .match_indices('<')
        .map(|(i, _)| i)
        .find(|&i| {
            let rest = &text[i + 1..];
            !rest.starts_with('?') && !rest.starts_with('!')
        })
        .unwrap_or(text.len());
    if start > first_element {
        return None;
    }

    let body_start = start + OPEN.len();
    let body = &text[body_start..];
    // An internal subset ends with "]>", otherwise the first '>' closes it.
    let end = match (body.find('['), body.find('>')) {
        (Some(bracket), Some(close)) if bracket < close => body.find("]>").map(|i| i + 1)?,
        (_, Some(close)) => close,
        _ => return None,
    };

    Some(body[..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    #[test]
    fn test_set_child_text_creates_child() {
        let mut element = Element::new("maplayer");
        set_child_text(&mut element, "title", "Urban");
        assert_eq!(child_text(&element, "title"), Some("Urban".to_string()));

        set_child_text(&mut element, "title", "Rural");
        assert_eq!(find_children(&element, "title").count(), 1);
        assert_eq!(child_text(&element, "title"), Some("Rural".to_string()));
    }

    #[test]
    fn test_child_text_ignores_blank() {
        let doc = XmlDocument::parse("<maplayer><title>  </title></maplayer>").unwrap();
        assert_eq!(child_text(&doc.root, "title"), None);
    }

    #[test]
    fn test_replace_child_in_place() {
        let mut doc = XmlDocument::parse("<l><a/><renderer-v2 type=\"x\"/><b/></l>").unwrap();
        replace_child(&mut doc.root, Element::new("renderer-v2").with_attribute("type", "y"));
        let names: Vec<&str> = doc.root.elements().map(Element::name).collect();
        assert_eq!(names, vec!["a", "renderer-v2", "b"]);
        assert_eq!(
            find_child(&doc.root, "renderer-v2").and_then(|r| r.attribute("type")),
            Some("y")
        );
    }

    #[test]
    fn test_extract_doctype_with_internal_subset() {
        let xml = "<!DOCTYPE note [<!ENTITY a \"b\">]><note/>";
        assert_eq!(
            extract_doctype(xml).as_deref(),
            Some("note [<!ENTITY a \"b\">]")
        );
    }

    #[test]
    fn test_extract_doctype_after_declaration() {
        let xml = "<?xml version=\"1.0\"?>\n<!DOCTYPE qgis>\n<qgis/>";
        assert_eq!(extract_doctype(xml).as_deref(), Some("qgis"));
    }

    #[test]
    fn test_extract_doctype_ignores_text_after_root() {
        let xml = "<qgis><![CDATA[<!DOCTYPE fake>]]></qgis>";
        assert_eq!(extract_doctype(xml), None);
    }
}
