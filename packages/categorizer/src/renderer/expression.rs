//! Building QGIS filter expressions for generated rules.

/// Value types QGIS writes for numeric category values.
const NUMERIC_TYPES: &[&str] = &[
    "int",
    "uint",
    "integer",
    "qlonglong",
    "qulonglong",
    "longlong",
    "ulonglong",
    "short",
    "ushort",
    "double",
    "float",
];

/// Characters that only occur in expressions, never in a plain field name.
const EXPRESSION_CHARS: &[char] = &[
    '(', ')', '+', '-', '*', '/', '|', '=', '<', '>', '\'', ',', '%', '^',
];

/// Quote a column name: `name` becomes `"name"`.
///
/// # Examples
/// ```
/// use qgs_categorizer::renderer::quoted_column_ref;
///
/// assert_eq!(quoted_column_ref("landuse"), "\"landuse\"");
/// assert_eq!(quoted_column_ref("a\"b"), "\"a\"\"b\"");
/// ```
#[must_use]
pub fn quoted_column_ref(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal: `it's` becomes `'it''s'`.
///
/// # Examples
/// ```
/// use qgs_categorizer::renderer::quoted_string;
///
/// assert_eq!(quoted_string("urban"), "'urban'");
/// assert_eq!(quoted_string("it's"), "'it''s'");
/// ```
#[must_use]
pub fn quoted_string(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('\'', "''")
        .replace('\n', "\\n")
        .replace('\t', "\\t");
    format!("'{escaped}'")
}

/// Quote a category value according to its stored type.
///
/// Numeric values are written bare, booleans as `TRUE`/`FALSE` and
/// everything else as a string literal. Values without a type are strings.
#[must_use]
pub fn quoted_value(value: &str, value_type: Option<&str>) -> String {
    match value_type.map(str::to_ascii_lowercase).as_deref() {
        Some(t) if NUMERIC_TYPES.contains(&t) && value.trim().parse::<f64>().is_ok() => {
            value.trim().to_string()
        }
        Some("bool") => {
            if value.eq_ignore_ascii_case("true") {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        _ => quoted_string(value),
    }
}

/// Reference a renderer's classification attribute inside an expression.
///
/// The attribute may be a field name or an expression. Field names are
/// quoted as columns; expressions are wrapped in parentheses. Names that
/// are already double-quoted are used unchanged.
///
/// # Examples
/// ```
/// use qgs_categorizer::renderer::class_attribute_ref;
///
/// assert_eq!(class_attribute_ref("landuse"), "\"landuse\"");
/// assert_eq!(class_attribute_ref("land use"), "\"land use\"");
/// assert_eq!(class_attribute_ref("\"landuse\""), "\"landuse\"");
/// assert_eq!(class_attribute_ref("pop / area"), "(pop / area)");
/// ```
#[must_use]
pub fn class_attribute_ref(attribute: &str) -> String {
    let trimmed = attribute.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed.to_string()
    } else if trimmed.contains(EXPRESSION_CHARS) {
        format!("({trimmed})")
    } else {
        quoted_column_ref(trimmed)
    }
}

/// Format a class boundary the way QGIS does (fixed, eight decimals).
///
/// # Examples
/// ```
/// use qgs_categorizer::renderer::format_boundary;
///
/// assert_eq!(format_boundary(10.0), "10.00000000");
/// assert_eq!(format_boundary(-0.5), "-0.50000000");
/// ```
#[must_use]
pub fn format_boundary(value: f64) -> String {
    format!("{value:.8}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_value_numeric() {
        assert_eq!(quoted_value("42", Some("int")), "42");
        assert_eq!(quoted_value("4.5", Some("double")), "4.5");
        assert_eq!(quoted_value("7", Some("qlonglong")), "7");
    }

    #[test]
    fn test_quoted_value_numeric_type_with_text() {
        assert_eq!(quoted_value("n/a", Some("int")), "'n/a'");
    }

    #[test]
    fn test_quoted_value_string_types() {
        assert_eq!(quoted_value("42", Some("QString")), "'42'");
        assert_eq!(quoted_value("42", None), "'42'");
        assert_eq!(quoted_value("Urban", Some("string")), "'Urban'");
    }

    #[test]
    fn test_quoted_value_bool() {
        assert_eq!(quoted_value("true", Some("bool")), "TRUE");
        assert_eq!(quoted_value("false", Some("bool")), "FALSE");
    }

    #[test]
    fn test_quoted_string_escapes() {
        assert_eq!(quoted_string("a\\b"), "'a\\\\b'");
        assert_eq!(quoted_string("line\nbreak"), "'line\\nbreak'");
    }

    #[test]
    fn test_class_attribute_ref_function_call() {
        assert_eq!(class_attribute_ref("upper(name)"), "(upper(name))");
        assert_eq!(class_attribute_ref("land-use"), "(land-use)");
    }
}
