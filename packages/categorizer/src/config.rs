//! Configuration constants and path helpers for the categorizer.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CategorizerError, Result};

/// Custom layer property that marks a layer for splitting.
pub const MARKER_PROPERTY: &str = "convert_categorized_layer";

/// Value written to [`MARKER_PROPERTY`] for marked layers.
pub const MARKER_TRUE: &str = "true";

/// Value assumed when a layer has no [`MARKER_PROPERTY`].
pub const MARKER_DEFAULT: &str = "false";

/// Suffix appended to the file stem when no destination is given.
pub const CATEGORIZED_SUFFIX: &str = "_categorized";

/// File extension of QGIS project files.
pub const PROJECT_EXTENSION: &str = "qgs";

/// Characters QGIS replaces with `_` when it derives a layer id.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LAYER_ID_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("valid regex"));

/// Check whether a marker property value means "split this layer".
///
/// The comparison is case-insensitive.
///
/// # Examples
/// ```
/// use qgs_categorizer::config::is_marked_value;
///
/// assert!(is_marked_value("true"));
/// assert!(is_marked_value("TRUE"));
/// assert!(!is_marked_value("false"));
/// assert!(!is_marked_value("yes"));
/// ```
#[must_use]
pub fn is_marked_value(value: &str) -> bool {
    value.eq_ignore_ascii_case(MARKER_TRUE)
}

/// Validate that a path can name a project file.
///
/// Only the shape of the path is checked; the file does not need to exist.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use qgs_categorizer::config::validate_project_path;
///
/// assert!(validate_project_path(Path::new("maps/city.qgs")).is_ok());
/// assert!(validate_project_path(Path::new("")).is_err());
/// assert!(validate_project_path(Path::new("maps/..")).is_err());
/// ```
pub fn validate_project_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.file_stem().is_none() {
        return Err(CategorizerError::InvalidProjectPath(
            path.display().to_string(),
        ));
    }
    Ok(())
}

/// Whether a path has the plain-XML project extension.
///
/// Zipped projects (`.qgz`) have to be unpacked before they can be split.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use qgs_categorizer::config::has_project_extension;
///
/// assert!(has_project_extension(Path::new("city.qgs")));
/// assert!(has_project_extension(Path::new("CITY.QGS")));
/// assert!(!has_project_extension(Path::new("city.qgz")));
/// ```
#[must_use]
pub fn has_project_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION))
}

/// Build the default destination for a split project.
///
/// The suffix is appended to the file stem and the extension is kept, so
/// `city.qgs` becomes `city_categorized.qgs` in the same directory.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use qgs_categorizer::config::default_destination;
///
/// let dest = default_destination(Path::new("/data/city.qgs")).unwrap();
/// assert_eq!(dest, Path::new("/data/city_categorized.qgs"));
/// ```
pub fn default_destination(source: &Path) -> Result<PathBuf> {
    validate_project_path(source)?;
    let stem = source
        .file_stem()
        .ok_or_else(|| CategorizerError::InvalidProjectPath(source.display().to_string()))?;

    let mut file_name = OsString::from(stem);
    file_name.push(CATEGORIZED_SUFFIX);
    if let Some(extension) = source.extension() {
        file_name.push(".");
        file_name.push(extension);
    }

    Ok(source.with_file_name(file_name))
}

/// Derive a fresh layer id from a layer name, the way QGIS does.
///
/// The name is followed by a random UUID and every non-word character is
/// replaced by `_`.
#[must_use]
pub fn generate_layer_id(name: &str) -> String {
    let raw = format!("{name}_{}", uuid::Uuid::new_v4());
    LAYER_ID_INVALID.replace_all(&raw, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_destination_keeps_directory() {
        let dest = default_destination(Path::new("projects/city.qgs")).unwrap();
        assert_eq!(dest, PathBuf::from("projects/city_categorized.qgs"));
    }

    #[test]
    fn test_default_destination_without_extension() {
        let dest = default_destination(Path::new("city")).unwrap();
        assert_eq!(dest, PathBuf::from("city_categorized"));
    }

    #[test]
    fn test_default_destination_with_dots_in_stem() {
        let dest = default_destination(Path::new("city.v2.qgs")).unwrap();
        assert_eq!(dest, PathBuf::from("city.v2_categorized.qgs"));
    }

    #[test]
    fn test_default_destination_rejects_empty_path() {
        let err = default_destination(Path::new("")).unwrap_err();
        assert!(matches!(err, CategorizerError::InvalidProjectPath(_)));
    }

    #[test]
    fn test_generate_layer_id() {
        let id = generate_layer_id("Land use");
        assert!(id.starts_with("Land_use_"));
        assert!(id.chars().all(|c| c.is_alphanumeric() || c == '_'));
        assert_ne!(id, generate_layer_id("Land use"));
    }

    #[test]
    fn test_is_marked_value_mixed_case() {
        assert!(is_marked_value("True"));
        assert!(!is_marked_value(MARKER_DEFAULT));
        assert!(!is_marked_value(""));
    }
}
