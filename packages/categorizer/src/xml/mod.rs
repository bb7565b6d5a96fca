//! XML document model: parsing, navigation and serialization.

mod tree;
mod utils;
mod writer;

pub use tree::{Element, Node, XmlDocument};
pub use utils::{
    child_text, extract_doctype, find_by_path, find_child, find_child_mut, find_children,
    get_text, replace_child, set_child_text,
};
pub use writer::{save_atomic, to_xml_string};
