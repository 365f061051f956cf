//! Service account authentication for Google APIs.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{ClientConfig, CredentialsSource, DRIVE_SCOPE, SHEETS_SCOPE};
use crate::error::{GoogleError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh tokens this long before Google expires them.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // Space separated OAuth scopes
    aud: String,   // Audience (token endpoint)
    exp: u64,
    iat: u64,
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

#[derive(Clone)]
enum TokenSource {
    ServiceAccount {
        credentials: Arc<ServiceAccountCredentials>,
        scope: String,
        cached_token: Arc<RwLock<Option<CachedToken>>>,
    },
    Static(String),
}

/// Authenticator for Google APIs using service account credentials.
#[derive(Clone)]
pub struct Authenticator {
    source: TokenSource,
    client: Client,
}

impl Authenticator {
    /// Create an authenticator from a service account JSON file with Drive and Sheets scopes.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let credentials = CredentialsSource::File(path.as_ref().to_path_buf()).load()?;
        Ok(Self::new(credentials, [DRIVE_SCOPE, SHEETS_SCOPE]))
    }

    /// Create an authenticator for the credentials and scopes in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let credentials = config.credentials().load()?;
        Ok(Self::new(credentials, config.scopes()))
    }

    /// Create a new authenticator from already validated credentials.
    pub fn new<I, S>(credentials: ServiceAccountCredentials, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope = scopes
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            source: TokenSource::ServiceAccount {
                credentials: Arc::new(credentials),
                scope,
                cached_token: Arc::new(RwLock::new(None)),
            },
            client: Client::new(),
        }
    }

    /// Use an access token obtained elsewhere. It is never refreshed.
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
            client: Client::new(),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        let (credentials, scope, cached_token) = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount {
                credentials,
                scope,
                cached_token,
            } => (credentials, scope, cached_token),
        };

        {
            let cached = cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + EXPIRY_BUFFER {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.refresh_token(credentials, scope).await?;
        *cached_token.write().await = Some(new_token.clone());

        Ok(new_token.access_token)
    }

    /// Exchange a signed JWT assertion for an access token.
    async fn refresh_token(
        &self,
        credentials: &ServiceAccountCredentials,
        scope: &str,
    ) -> Result<CachedToken> {
        let token_uri = credentials.token_uri.as_deref().unwrap_or(TOKEN_URI);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GoogleError::AuthenticationError(e.to_string()))?
            .as_secs();

        let claims = Claims {
            iss: credentials.client_email.clone(),
            scope: scope.to_string(),
            aud: token_uri.to_string(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
        let jwt = encode(&header, &claims, &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        debug!(client_email = %credentials.client_email, "requesting access token");
        let response = self.client.post(token_uri).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleError::TokenRefreshError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(token_response.expires_in),
        })
    }
}
