//! Client configuration: where credentials come from and which scopes to request.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GoogleError, Result};
use crate::models::ServiceAccountCredentials;

/// Google Drive API scope.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Google Sheets API scope.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const SCOPES_ENV: &str = "GOOGLE_SCOPES";
pub const SHARED_DRIVE_ENV: &str = "SHARED_DRIVE_ID";

/// Where service account credentials are loaded from.
#[derive(Debug, Clone)]
pub enum CredentialsSource {
    /// Path to a service account JSON key file.
    File(PathBuf),
    /// Credentials supplied directly by the caller.
    Inline(ServiceAccountCredentials),
}

impl CredentialsSource {
    /// Load and validate the credentials.
    pub fn load(&self) -> Result<ServiceAccountCredentials> {
        let credentials = match self {
            CredentialsSource::File(path) => read_credentials_file(path)?,
            CredentialsSource::Inline(credentials) => credentials.clone(),
        };
        credentials.validate()?;
        Ok(credentials)
    }
}

fn read_credentials_file(path: &Path) -> Result<ServiceAccountCredentials> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Immutable configuration shared by the Drive and Sheets clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    credentials: CredentialsSource,
    scopes: Vec<String>,
    drive_id: Option<String>,
}

impl ClientConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Configuration from a key file with the default scopes.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().credentials_file(path).build()
    }

    /// Configuration from `GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_SCOPES`
    /// (comma separated) and `SHARED_DRIVE_ID`.
    pub fn from_env() -> Result<Self> {
        let path = env::var(CREDENTIALS_ENV).map_err(|_| {
            GoogleError::Configuration(format!("{} is not set", CREDENTIALS_ENV))
        })?;

        let mut builder = Self::builder().credentials_file(path);

        if let Ok(scopes) = env::var(SCOPES_ENV) {
            builder = builder.scopes(parse_scopes(&scopes));
        }
        if let Ok(drive_id) = env::var(SHARED_DRIVE_ENV) {
            if !drive_id.trim().is_empty() {
                builder = builder.shared_drive(drive_id.trim());
            }
        }

        builder.build()
    }

    pub fn credentials(&self) -> &CredentialsSource {
        &self.credentials
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Shared drive to operate in; `None` means the service account's My Drive.
    pub fn drive_id(&self) -> Option<&str> {
        self.drive_id.as_deref()
    }
}

/// Split a comma separated scope list, dropping blanks.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    file: Option<PathBuf>,
    inline: Option<ServiceAccountCredentials>,
    scopes: Vec<String>,
    drive_id: Option<String>,
}

impl ConfigBuilder {
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn inline_credentials(mut self, credentials: ServiceAccountCredentials) -> Self {
        self.inline = Some(credentials);
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn shared_drive(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }

    /// Exactly one credential form must be set. Inline credentials are validated
    /// here; file credentials are validated when the file is read.
    pub fn build(self) -> Result<ClientConfig> {
        let credentials = match (self.file, self.inline) {
            (Some(path), None) => CredentialsSource::File(path),
            (None, Some(credentials)) => {
                credentials.validate()?;
                CredentialsSource::Inline(credentials)
            }
            (None, None) => {
                return Err(GoogleError::Configuration(
                    "either a credentials file or inline credentials must be provided".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(GoogleError::Configuration(
                    "provide a credentials file or inline credentials, not both".to_string(),
                ))
            }
        };

        let scopes = if self.scopes.is_empty() {
            vec![DRIVE_SCOPE.to_string(), SHEETS_SCOPE.to_string()]
        } else {
            self.scopes
        };

        Ok(ClientConfig {
            credentials,
            scopes,
            drive_id: self.drive_id,
        })
    }
}
