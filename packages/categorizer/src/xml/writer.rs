//! XML serialization and atomic file output.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use super::tree::{Element, Node, XmlDocument};
use crate::error::{CategorizerError, Result};

/// Indentation used for output, matching what QGIS writes.
const INDENT_WIDTH: usize = 2;

/// Serialize a document to a string.
///
/// Elements without children are written as empty tags and nested
/// elements are indented by two spaces.
pub fn to_xml_string(doc: &XmlDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    if doc.has_declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }
    if let Some(doctype) = &doc.doctype {
        writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
    }
    for node in &doc.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &doc.root)?;

    let mut output = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    output.push('\n');
    Ok(output)
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
        Node::ProcessingInstruction { target, value } => {
            let content = match value {
                Some(value) => format!("{target} {value}"),
                None => target.clone(),
            };
            writer.write_event(Event::PI(BytesText::from_escaped(content)))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escape_attribute(value).into_bytes()),
        });
    }

    if element.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in element.children() {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name())))?;
    Ok(())
}

/// Escape an attribute value.
///
/// Line breaks and tabs are written as character references so that
/// multi-line expressions survive attribute-value normalization on reload.
fn escape_attribute(value: &str) -> String {
    escape(value)
        .replace('\n', "&#xa;")
        .replace('\r', "&#xd;")
        .replace('\t', "&#x9;")
}

/// Serialize a document and write it to `path`.
///
/// Uses atomic write pattern: writes to a hidden temp file next to the
/// target, syncs it to disk, then renames. A crash mid-write leaves any
/// existing file at `path` untouched.
pub fn save_atomic(doc: &XmlDocument, path: &Path) -> Result<()> {
    let content = to_xml_string(doc)?;
    let write_err = |source| CategorizerError::Write {
        path: path.to_path_buf(),
        source,
    };

    let temp_file = temp_path(path)?;
    {
        let mut file = File::create(&temp_file).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path).map_err(write_err)?;
    }

    if let Err(source) = fs::rename(&temp_file, path) {
        let _ = fs::remove_file(&temp_file);
        return Err(write_err(source));
    }

    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CategorizerError::InvalidProjectPath(path.display().to_string()))?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}
