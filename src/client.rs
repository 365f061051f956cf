//! Combined Drive and Sheets client plus shared response handling.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::drive::DriveClient;
use crate::error::{GoogleError, Result};
use crate::sheets::SheetsClient;

/// Turn a non-success response into `GoogleError::ApiError`.
pub(crate) async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GoogleError::from_api_body(status.as_u16(), &body))
}

/// Check the status and decode the JSON body.
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_response(response).await?;
    Ok(response.json().await?)
}

/// Entry point bundling a [`DriveClient`] and a [`SheetsClient`] that share one
/// authenticator.
///
/// ```no_run
/// use gdrive_sheets::{ClientConfig, GoogleClient};
///
/// # async fn run() -> gdrive_sheets::Result<()> {
/// let config = ClientConfig::from_file("service-account.json")?;
/// let client = GoogleClient::new(&config)?;
///
/// let folder_id = client.drive().resolve_folder_path("Reports/2024").await?;
/// let url = "https://docs.google.com/spreadsheets/d/1abc/edit";
/// client.sheets().update_cell(url, "Sheet1", 0, 1, "done".into(), 0).await?;
/// # let _ = folder_id;
/// # Ok(())
/// # }
/// ```
pub struct GoogleClient {
    drive: DriveClient,
    sheets: SheetsClient,
}

impl GoogleClient {
    /// Load credentials from `config` and build both clients.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let auth = Authenticator::from_config(config)?;
        Ok(Self::with_auth(auth, config.drive_id().map(str::to_string)))
    }

    pub fn with_auth(auth: Authenticator, drive_id: Option<String>) -> Self {
        Self {
            drive: DriveClient::new(auth.clone(), drive_id),
            sheets: SheetsClient::new(auth),
        }
    }

    pub fn drive(&self) -> &DriveClient {
        &self.drive
    }

    pub fn sheets(&self) -> &SheetsClient {
        &self.sheets
    }
}
