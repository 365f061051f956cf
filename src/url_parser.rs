//! URL parsing for Google Drive and Google Sheets identifiers.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{GoogleError, Result};

/// Drive URL shapes that carry a file or folder ID in their first capture group.
static DRIVE_URL_REGEXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)",
        r"^https?://drive\.google\.com/file/d/([a-zA-Z0-9_-]+)",
        r"^https?://drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)",
    ]
    .map(|pattern| Regex::new(pattern).expect("Invalid Drive URL regex"))
});

static SPREADSHEET_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("Invalid spreadsheet URL regex")
});

/// Valid Google ID pattern (alphanumeric, underscore, hyphen).
static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Extract a Google Drive ID from a URL or validate a raw ID.
///
/// Supports the following URL formats:
/// - `https://drive.google.com/drive/folders/<ID>`
/// - `https://drive.google.com/drive/u/0/folders/<ID>`
/// - `https://drive.google.com/file/d/<ID>/view`
/// - `https://drive.google.com/open?id=<ID>`
/// - Raw ID string
///
/// # Examples
///
/// ```
/// use gdrive_sheets::url_parser::extract_id;
///
/// let id = extract_id("https://drive.google.com/drive/folders/1abc123").unwrap();
/// assert_eq!(id, "1abc123");
///
/// let id = extract_id("1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// ```
pub fn extract_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();

    let from_url = DRIVE_URL_REGEXES
        .iter()
        .find_map(|re| re.captures(trimmed))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string());

    if let Some(id) = from_url {
        return Ok(id);
    }

    if ID_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(GoogleError::InvalidUrlOrId(url_or_id.to_string()))
}

/// Pull the spreadsheet ID out of a `.../spreadsheets/d/<ID>/...` URL.
///
/// ```
/// use gdrive_sheets::url_parser::extract_spreadsheet_id;
///
/// let url = "https://docs.google.com/spreadsheets/d/1abc123def/edit";
/// assert_eq!(extract_spreadsheet_id(url).as_deref(), Some("1abc123def"));
/// assert_eq!(extract_spreadsheet_id("https://example.com/sheet"), None);
/// ```
pub fn extract_spreadsheet_id(url: &str) -> Option<String> {
    SPREADSHEET_URL_REGEX
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Like [`extract_spreadsheet_id`], failing with `InvalidSheetUrl` on no match.
pub fn spreadsheet_id(url: &str) -> Result<String> {
    extract_spreadsheet_id(url).ok_or_else(|| GoogleError::InvalidSheetUrl(url.to_string()))
}
