//! Export pipeline
//!
//! This module provides the stages of an export session:
//! - Survey selection ([`filter`])
//! - Job submission ([`submit`]) and completion polling ([`watch`])
//! - Artifact download ([`retrieve`]) and unpacking ([`extract`])
//! - The session report ([`summary`]) and its persistence ([`metadata`])
//! - Orchestration of all of the above ([`coordinator`])

pub mod coordinator;
pub mod extract;
pub mod filter;
pub mod metadata;
pub mod retrieve;
pub mod submit;
pub mod summary;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::ExportCoordinator;
pub use extract::{ArchiveExtractor, ExtractionSummary};
pub use filter::SurveyFilter;
pub use metadata::{read_report, MetadataWriter};
pub use retrieve::{DownloadedExport, Retrieval, Retriever};
pub use submit::{JobSubmitter, Submission, SubmissionMap};
pub use summary::{
    ExportDetail, FailureRecord, FailureStage, SessionReport, StageAborted, SurveyRecord,
};
pub use watch::{CompletionWatcher, WatchOutcome};
