//! Folder path parsing and Drive query construction.

use crate::models::FOLDER_MIME_TYPE;

/// Split a slash-delimited folder path into its non-blank segments.
///
/// Segments are kept verbatim so folders are looked up by their exact name;
/// only empty and whitespace-only segments are dropped.
///
/// ```
/// use gdrive_sheets::folders::parse_folder_path;
///
/// assert_eq!(parse_folder_path("a/b/c"), vec!["a", "b", "c"]);
/// assert!(parse_folder_path("/").is_empty());
/// ```
pub fn parse_folder_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Escape a value for use inside a single-quoted Drive query string.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Query for non-trashed folders named `name` directly under `parent_id`.
pub fn folder_query(name: &str, parent_id: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and '{}' in parents and trashed = false",
        escape_query_value(name),
        FOLDER_MIME_TYPE,
        escape_query_value(parent_id)
    )
}

/// Query for non-trashed items of any type named `name` under `parent_id`.
pub fn name_query(name: &str, parent_id: &str) -> String {
    format!(
        "name = '{}' and '{}' in parents and trashed = false",
        escape_query_value(name),
        escape_query_value(parent_id)
    )
}

/// Query for all non-trashed children of `parent_id`.
pub fn children_query(parent_id: &str) -> String {
    format!(
        "'{}' in parents and trashed = false",
        escape_query_value(parent_id)
    )
}
