//! Domain identifier types with validation
//!
//! Newtype wrappers keep the two identifier spaces of the platform apart: the
//! numeric export-target id a survey is exported under, and the opaque job id
//! the platform assigns to each export request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export-target identifier ("platform form id")
///
/// The identifier the platform uses to correlate a survey with its export
/// jobs. Distinct from the survey's own internal id.
///
/// # Examples
///
/// ```
/// use vibrent_export::domain::ids::ExportTargetId;
/// use std::str::FromStr;
///
/// let target = ExportTargetId::from_str("1042").unwrap();
/// assert_eq!(target.value(), 1042);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportTargetId(i64);

impl ExportTargetId {
    /// Creates a new ExportTargetId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExportTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportTargetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| format!("Invalid export target id '{s}': {e}"))
    }
}

impl From<i64> for ExportTargetId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Export job identifier
///
/// Opaque string assigned by the platform when an export is requested.
///
/// # Examples
///
/// ```
/// use vibrent_export::domain::ids::JobId;
///
/// let job = JobId::new("c0ffee-42").unwrap();
/// assert_eq!(job.as_str(), "c0ffee-42");
/// assert!(JobId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_target_id_parse() {
        let id = ExportTargetId::from_str(" 17 ").unwrap();
        assert_eq!(id.value(), 17);
        assert_eq!(id.to_string(), "17");
    }

    #[test]
    fn test_export_target_id_invalid() {
        assert!(ExportTargetId::from_str("abc").is_err());
        assert!(ExportTargetId::from_str("").is_err());
    }

    #[test]
    fn test_job_id_empty() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("   ").is_err());
    }

    #[test]
    fn test_job_id_display_and_inner() {
        let job = JobId::new("exp-1").unwrap();
        assert_eq!(job.to_string(), "exp-1");
        assert_eq!(job.clone().into_inner(), "exp-1".to_string());
        assert_eq!(job.as_ref(), "exp-1");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let target = ExportTargetId::new(5);
        let job = JobId::new("j-5").unwrap();
        assert_eq!(serde_json::to_string(&target).unwrap(), "5");
        assert_eq!(serde_json::to_string(&job).unwrap(), "\"j-5\"");
    }
}
