//! Data models for Google Drive and Google Sheets API payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GoogleError, Result};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Account type marker every service account key carries.
pub const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Metadata for a file or folder in Google Drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub web_content_link: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
}

impl FileMetadata {
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| s.parse::<u64>().map_err(serde::de::Error::custom))
        .transpose()
}

impl std::fmt::Display for FileMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = match (self.size, self.is_folder()) {
            (_, true) => "<dir>".to_string(),
            (Some(s), false) => format_size(s),
            (None, false) => "-".to_string(),
        };
        let mime = self.mime_type.as_deref().unwrap_or("-");
        write!(f, "{:<44} {:>10} {:<30} {}", self.id, size_str, mime, self.name)
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body sent to files.create for metadata-only items such as folders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub parents: Vec<&'a str>,
}

/// Response from files.create. The id is optional so a missing id can be reported
/// instead of failing deserialization.
#[derive(Debug, Deserialize)]
pub struct CreatedFile {
    #[serde(default)]
    pub id: Option<String>,
}

/// User information from the about API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email_address: Option<String>,
    pub display_name: Option<String>,
}

/// Storage quota information. Drive reports every figure as a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuota {
    pub limit: Option<String>,
    pub usage: Option<String>,
    pub usage_in_drive: Option<String>,
    pub usage_in_drive_trash: Option<String>,
}

impl StorageQuota {
    /// Quota limit in bytes; `None` means unlimited.
    pub fn limit_bytes(&self) -> Option<u64> {
        self.limit.as_deref().and_then(|v| v.parse().ok())
    }

    pub fn usage_bytes(&self) -> u64 {
        self.usage.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    /// Bytes still available, saturating at zero.
    pub fn available_bytes(&self) -> Option<u64> {
        self.limit_bytes()
            .map(|limit| limit.saturating_sub(self.usage_bytes()))
    }
}

/// About response from the Drive API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub user: User,
    pub storage_quota: StorageQuota,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account credentials, either read from a key file or supplied inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountCredentials {
    /// Check the fields the token exchange depends on.
    pub fn validate(&self) -> Result<()> {
        if self.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(GoogleError::Configuration(format!(
                "credentials type must be '{}', got '{}'",
                SERVICE_ACCOUNT_TYPE, self.account_type
            )));
        }

        let missing: Vec<&str> = [
            ("project_id", &self.project_id),
            ("private_key", &self.private_key),
            ("client_email", &self.client_email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(GoogleError::Configuration(format!(
                "credentials missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Who a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grantee {
    User,
    Group,
    Domain,
    Anyone,
}

/// Access level granted by a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

/// A Drive permission, as sent to permissions.create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(rename = "type")]
    pub grantee: Grantee,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub domain: Option<String>,
}

impl Permission {
    pub fn user(email: impl Into<String>, role: Role) -> Self {
        Self {
            grantee: Grantee::User,
            role,
            email_address: Some(email.into()),
            domain: None,
        }
    }

    /// Anyone with the link can view.
    pub fn anyone_reader() -> Self {
        Self {
            grantee: Grantee::Anyone,
            role: Role::Reader,
            email_address: None,
            domain: None,
        }
    }

    pub fn domain(domain: impl Into<String>, role: Role) -> Self {
        Self {
            grantee: Grantee::Domain,
            role,
            email_address: None,
            domain: Some(domain.into()),
        }
    }
}

/// Permission as returned by permissions.create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResult {
    pub id: String,
    #[serde(rename = "type", default)]
    pub grantee: Option<Grantee>,
    #[serde(default)]
    pub role: Option<Role>,
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

/// Raw spreadsheets.get response, restricted to the fields this crate asks for.
#[derive(Debug, Deserialize)]
pub struct SpreadsheetResponse {
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SpreadsheetProperties {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: u64,
    pub title: String,
    #[serde(default)]
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
}

/// Spreadsheet title plus its tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetInfo {
    pub spreadsheet_id: String,
    pub title: String,
    pub sheets: Vec<SheetInfo>,
}

impl SpreadsheetInfo {
    pub fn sheet(&self, name: &str) -> Option<&SheetInfo> {
        self.sheets.iter().find(|s| s.title == name)
    }
}

/// One tab of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub sheet_id: u64,
    pub title: String,
    pub row_count: u32,
    pub column_count: u32,
}

impl From<SheetProperties> for SheetInfo {
    fn from(props: SheetProperties) -> Self {
        let (row_count, column_count) = props
            .grid_properties
            .map(|g| (g.row_count, g.column_count))
            .unwrap_or_default();
        Self {
            sheet_id: props.sheet_id,
            title: props.title,
            row_count,
            column_count,
        }
    }
}

/// A block of cell values addressed by an A1 range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    pub fn rows(range: String, values: Vec<Vec<Value>>) -> Self {
        Self {
            range,
            major_dimension: Some("ROWS".to_string()),
            values,
        }
    }

    pub fn columns(range: String, values: Vec<Vec<Value>>) -> Self {
        Self {
            range,
            major_dimension: Some("COLUMNS".to_string()),
            values,
        }
    }
}

/// Body for values:batchUpdate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub value_input_option: &'static str,
    pub data: Vec<ValueRange>,
}

/// Summary returned by value writes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: u32,
    #[serde(default)]
    pub updated_columns: u32,
    #[serde(default)]
    pub updated_cells: u32,
}

/// Summary returned by values:batchUpdate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub total_updated_rows: u32,
    #[serde(default)]
    pub total_updated_columns: u32,
    #[serde(default)]
    pub total_updated_cells: u32,
}

/// A single cell write addressed by logical data row and column index.
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub data_row: u32,
    pub column: u32,
    pub value: Value,
}

impl CellUpdate {
    pub fn new(data_row: u32, column: u32, value: impl Into<Value>) -> Self {
        Self {
            data_row,
            column,
            value: value.into(),
        }
    }
}

/// Header row plus the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl SheetData {
    /// Look up a cell by logical data row and header name.
    pub fn get(&self, data_row: usize, header: &str) -> Option<&Value> {
        let column = self.headers.iter().position(|h| h == header)?;
        self.rows.get(data_row)?.get(column)
    }
}
