//! QGS Categorizer - Split classified QGIS layers into one layer per class.
//!
//! A layer whose symbology is categorized, graduated or rule-based can be
//! tagged in a QGIS project (`.qgs`). Splitting the project replaces every
//! tagged layer with a group of the same name holding one copy of the layer
//! per class, each drawing only its own class.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use qgs_categorizer::config;
//!
//! let dest = config::default_destination(Path::new("city.qgs")).unwrap();
//! assert_eq!(dest, Path::new("city_categorized.qgs"));
//! assert!(config::is_marked_value("True"));
//! ```
//!
//! # Architecture
//!
//! The categorizer is organized into several modules:
//!
//! - [`config`]: Configuration constants and path helpers
//! - [`error`]: Error types and Result alias
//! - [`xml`]: Owned XML tree, serialization and atomic writes
//! - [`project`]: Project document, layer registry and layer tree
//! - [`renderer`]: Renderer variants and conversion to rule-based
//! - [`marker`]: Tagging layers for splitting
//! - [`splitter`]: Splitting tagged layers
//! - [`inspect`]: Layer summaries
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod inspect;
pub mod marker;
pub mod project;
pub mod renderer;
pub mod splitter;
pub mod xml;

// Re-export main functions
pub use marker::{mark_for_conversion, marked_layer_names};
pub use splitter::{split, split_categorized_layers, split_with_report, SplitReport};

// Re-export commonly used items
pub use config::default_destination;
pub use error::{CategorizerError, Result};
pub use project::{MapLayer, ProjectDocument};
pub use renderer::{ClassItem, Renderer, RendererKind};
