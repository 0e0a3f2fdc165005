//! Secure credential handling using the secrecy crate
//!
//! The platform client secret is held in a [`SecretString`]: memory is zeroed
//! when it is dropped, `Debug` output is redacted, and reading it requires an
//! explicit `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use vibrent_export::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let secret = secret_string("s3cr3t".to_string());
//! assert_eq!(secret.expose_secret().as_ref(), "s3cr3t");
//! assert!(!format!("{secret:?}").contains("s3cr3t"));
//! ```

use crate::domain::{ExporterError, Result};
use secrecy::{CloneableSecret, DebugSecret, ExposeSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Environment variable holding the OAuth2 client id
pub const CLIENT_ID_VAR: &str = "VIBRENT_CLIENT_ID";

/// Environment variable holding the OAuth2 client secret
pub const CLIENT_SECRET_VAR: &str = "VIBRENT_CLIENT_SECRET";

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// OAuth2 client credentials for the token endpoint
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    /// Client id (not secret, may be logged)
    pub client_id: String,

    /// Client secret
    pub client_secret: SecretString,
}

impl ClientCredentials {
    /// Create credentials from plain values
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: secret_string(client_secret.into()),
        }
    }

    /// Read credentials from `VIBRENT_CLIENT_ID` / `VIBRENT_CLIENT_SECRET`
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming every missing or empty variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        match (read(CLIENT_ID_VAR), read(CLIENT_SECRET_VAR)) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            (id, secret) => {
                let missing: Vec<&str> = [
                    (CLIENT_ID_VAR, id.is_none()),
                    (CLIENT_SECRET_VAR, secret.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(ExporterError::Configuration(format!(
                    "Missing client credentials: set {}",
                    missing.join(" and ")
                )))
            }
        }
    }

    /// The client secret, for building the Basic auth header
    pub(crate) fn secret(&self) -> &str {
        self.client_secret.expose_secret().as_ref()
    }
}
