// Vibrent Export - Survey data export tool
// Copyright (c) 2025 Vibrent Export Contributors
// Licensed under the MIT License

//! # Vibrent Export - Survey Data Export
//!
//! Vibrent Export drives bulk survey data exports from the Vibrent Health
//! platform: it lists the surveys visible to a client, requests one
//! asynchronous export job per survey, waits for the jobs to finish, downloads
//! and unpacks the resulting archives and writes a session report.
//!
//! ## Overview
//!
//! A session runs these stages in order:
//! - **Listing** surveys through the platform API
//! - **Filtering** them by id and count
//! - **Submitting** one export job per survey
//! - **Watching** the jobs until every one is terminal or the wait budget runs out
//! - **Retrieving** the archives of completed jobs
//! - **Unpacking** the payload files
//! - **Reporting** the outcome to `export_metadata.json`
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Session workflow (submission, watching, retrieval, report)
//! - [`adapters`] - Platform integration (token provider, API gateway)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vibrent_export::config::{load_config, ClientCredentials};
//! use vibrent_export::core::export::ExportCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("vibrent_export.toml")?;
//!     let credentials = ClientCredentials::from_env()?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let coordinator = ExportCoordinator::new(config, credentials, None, shutdown_rx)?;
//!     let report = coordinator.execute_export().await?;
//!
//!     println!(
//!         "{} of {} surveys exported",
//!         report.successful_exports, report.total_surveys
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::ExporterError`]. Per-survey
//! failures do not abort a session; they are collected in the
//! [`core::export::SessionReport`] instead.
//!
//! ## Logging
//!
//! Logging goes through `tracing`; see [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
