//! OAuth2 client-credentials token provider
//!
//! The platform issues bearer tokens through a client-credentials grant
//! (HTTP Basic auth with the client id/secret, form body
//! `grant_type=client_credentials`). The provider caches the current token and
//! renews it once it is within the refresh buffer of its expiry.

use super::models::TokenResponse;
use crate::config::{AuthConfig, ClientCredentials};
use crate::domain::{ExporterError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tokio::sync::Mutex;

/// Token lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

const MAX_REFRESH_BUFFER_SECONDS: u64 = 86_400;

const MAX_EXPIRES_IN_SECONDS: i64 = 365 * 86_400;

/// A bearer token and the moment it stops being accepted
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Expiry instant
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the token expires within `buffer` of `now`
    pub fn needs_refresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at - now <= buffer
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token provider for the platform API
///
/// # Example
///
/// ```no_run
/// use vibrent_export::adapters::vibrent::TokenProvider;
/// use vibrent_export::config::{AuthConfig, ClientCredentials};
///
/// # async fn example() -> vibrent_export::domain::Result<()> {
/// let provider = TokenProvider::new(
///     "https://auth.example.com/oauth/token",
///     ClientCredentials::from_env()?,
///     &AuthConfig::default(),
/// )?;
/// let token = provider.get_valid_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct TokenProvider {
    client: Client,
    token_url: String,
    credentials: ClientCredentials,
    refresh_buffer: Duration,
    state: Mutex<Option<Credential>>,
}

impl TokenProvider {
    /// Create a provider for `token_url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(
        token_url: impl Into<String>,
        credentials: ClientCredentials,
        config: &AuthConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ExporterError::Configuration(format!("Failed to build token HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            token_url: token_url.into(),
            credentials,
            refresh_buffer: Duration::seconds(
                config.refresh_buffer_seconds.min(MAX_REFRESH_BUFFER_SECONDS) as i64,
            ),
            state: Mutex::new(None),
        })
    }

    /// Return a token that is valid for at least the refresh buffer
    ///
    /// Authenticates when no token is cached or the cached one expires within
    /// the buffer. Concurrent callers wait for a single renewal.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Authentication`] when the token endpoint
    /// rejects the request, is unreachable, or answers without a token.
    pub async fn get_valid_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(credential) = state.as_ref() {
            if !credential.needs_refresh(Utc::now(), self.refresh_buffer) {
                return Ok(credential.token.clone());
            }
            tracing::debug!(
                expires_at = %credential.expires_at,
                "Access token expiring soon, re-authenticating"
            );
        }

        let credential = self.authenticate().await?;
        let token = credential.token.clone();
        *state = Some(credential);
        Ok(token)
    }

    /// Request a new token from the token endpoint
    async fn authenticate(&self) -> Result<Credential> {
        tracing::debug!(
            token_url = %self.token_url,
            client_id = %self.credentials.client_id,
            "Requesting access token with client credentials"
        );

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(self.credentials.secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                ExporterError::Authentication(format!("Failed to request access token: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExporterError::Authentication(format!(
                "Token request failed with status {status}: {error_text}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            ExporterError::Authentication(format!("Failed to parse token response: {e}"))
        })?;

        let token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ExporterError::Authentication("Token response has no access_token".to_string())
            })?;

        let expires_in = token_response
            .expires_in
            .unwrap_or(DEFAULT_EXPIRES_IN_SECONDS)
            .clamp(0, MAX_EXPIRES_IN_SECONDS);
        let expires_at = Utc::now() + Duration::seconds(expires_in);

        tracing::info!(expires_at = %expires_at, "Successfully acquired access token");

        Ok(Credential::new(token, expires_at))
    }

    #[cfg(test)]
    pub(crate) async fn set_credential(&self, credential: Credential) {
        *self.state.lock().await = Some(credential);
    }
}
