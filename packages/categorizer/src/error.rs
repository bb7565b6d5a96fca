//! Error types for the categorizer.
//!
//! Load and save failures carry the path they relate to. Layers that are
//! skipped during splitting are not errors; they are reported through
//! [`crate::splitter::SplitReport`].

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the categorizer library.
#[derive(Debug, Error)]
pub enum CategorizerError {
    /// Project file could not be read.
    #[error("Failed to read project file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Project file is not well-formed XML.
    #[error("Failed to parse project file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// XML parsing failed for an in-memory document.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// Project file could not be written.
    #[error("Failed to write project file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML serialization failed.
    #[error("XML serialization failed: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    /// The project was never loaded from or saved to a file.
    #[error("Project has no backing file to write to")]
    NoBackingPath,

    /// A path argument cannot name a project file.
    #[error("Invalid project path: '{0}'")]
    InvalidProjectPath(String),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CategorizerError {
    /// Whether this error happened while loading a document.
    ///
    /// Load errors leave no output behind.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Parse { .. } | Self::XmlParse(_) | Self::MissingElement { .. }
        )
    }
}

/// Result type alias for categorizer operations.
pub type Result<T> = std::result::Result<T, CategorizerError>;
