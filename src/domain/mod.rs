//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ExportTargetId`], [`JobId`])
//! - **Domain models** ([`Survey`], [`ExportRequest`], [`ExportStatus`])
//! - **Error types** ([`ExporterError`], [`ApiError`], [`ExtractionError`], [`DecodeError`])
//! - **Result type alias** ([`Result`])
//!
//! # Decoding
//!
//! Platform payloads are loosely typed. Each entity has an explicit
//! `from_value` decoder that applies defaults for absent fields and returns a
//! typed [`DecodeError`] on type mismatch:
//!
//! ```rust
//! use vibrent_export::domain::{ExportStatus, JobId, JobStatus};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = JobId::new("exp-1")?;
//! let status = ExportStatus::from_value(&json!({"status": "IN_PROGRESS"}), &job)?;
//! assert_eq!(status.status, JobStatus::InProgress);
//! # Ok(())
//! # }
//! ```

mod decode;
pub mod errors;
pub mod export;
pub mod ids;
pub mod result;
pub mod survey;

pub use errors::{ApiError, DecodeError, ExporterError, ExtractionError};
pub use export::{ExportFormat, ExportRequest, ExportStatus, JobStatus};
pub use ids::{ExportTargetId, JobId};
pub use result::Result;
pub use survey::Survey;
