//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Errors are split
//! into fatal kinds (configuration, authentication) that abort a session and
//! recoverable kinds (API, extraction) that the orchestration layer records
//! as failure entries before moving on. No third-party error types leak out
//! of this module.

use std::path::PathBuf;
use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Missing or invalid settings, detected before any network activity
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token acquisition failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Non-success HTTP response or transport failure from the platform API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Archive read/write failure
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A payload could not be decoded into a domain record
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O errors outside of the API gateway
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The session was stopped by a shutdown signal
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl ExporterError {
    /// Returns true for errors that must abort the whole session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExporterError::Configuration(_)
                | ExporterError::Authentication(_)
                | ExporterError::Interrupted(_)
        )
    }
}

/// Platform API errors
///
/// Every gateway operation reports failures through this type. Only messages
/// are kept; the HTTP client's own error types are not exposed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("request to {endpoint} failed with status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect error, timeout, ...)
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The response body did not have the expected shape
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// Writing a downloaded artifact failed
    #[error("failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl ApiError {
    /// HTTP status code, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive could not be opened or is not a valid zip file
    #[error("failed to read archive {archive}: {reason}")]
    InvalidArchive { archive: PathBuf, reason: String },

    /// Reading an entry or writing the extracted file failed
    #[error("failed to extract {entry} from {archive}: {reason}")]
    Entry {
        archive: PathBuf,
        entry: String,
        reason: String,
    },
}

/// Typed decoding errors for loosely-typed platform payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload was not a JSON object
    #[error("expected a JSON object for {entity}")]
    NotAnObject { entity: &'static str },

    /// A field was present with the wrong JSON type
    #[error("field '{field}' of {entity} has the wrong type: expected {expected}")]
    TypeMismatch {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// A required field was missing
    #[error("field '{field}' of {entity} is missing")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExporterError {
    fn from(err: toml::de::Error) -> Self {
        ExporterError::Configuration(format!("TOML parse error: {err}"))
    }
}
