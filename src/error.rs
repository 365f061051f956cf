//! Error types for the gdrive_sheets crate.

use thiserror::Error;

use crate::models::ApiErrorResponse;

/// Errors that can occur when talking to Google Drive or Google Sheets.
#[derive(Error, Debug)]
pub enum GoogleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid spreadsheet URL: {0}")]
    InvalidSheetUrl(String),

    #[error("Sheet '{sheet}' not found in spreadsheet {spreadsheet}")]
    SheetNotFound { spreadsheet: String, sheet: String },

    #[error("Invalid column name: '{0}'")]
    InvalidColumnName(String),

    #[error("Failed to create folder '{0}': no id returned")]
    FolderCreationFailed(String),

    #[error("Local file not found: {0}")]
    LocalFileNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Failed to read credentials file: {0}")]
    CredentialsFileError(#[from] std::io::Error),

    #[error("Failed to parse credentials JSON: {0}")]
    CredentialsParseError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),
}

impl GoogleError {
    /// Build an `ApiError` from a failed response body.
    ///
    /// Google's `{"error": {"code", "message"}}` envelope is unpacked when present,
    /// otherwise the HTTP status and raw body are kept as-is.
    pub fn from_api_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(api_error) => GoogleError::ApiError {
                status: api_error.error.code,
                message: api_error.error.message,
            },
            Err(_) => GoogleError::ApiError {
                status,
                message: body.to_string(),
            },
        }
    }

    /// Whether the remote service rejected the call (as opposed to a local failure).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::ApiError { .. } | Self::HttpError(_))
    }
}

/// Result type alias for GoogleError.
pub type Result<T> = std::result::Result<T, GoogleError>;
