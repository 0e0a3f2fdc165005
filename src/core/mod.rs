//! Core business logic.
//!
//! # Modules
//!
//! - [`export`] - The export pipeline and its coordinator
//! - [`shutdown`] - Cooperative cancellation on SIGINT/SIGTERM
//!
//! # Export Workflow
//!
//! 1. **List**: Fetch the surveys visible to the client
//! 2. **Select**: Apply inclusion/exclusion lists and the survey cap
//! 3. **Submit**: Request one export job per survey
//! 4. **Watch**: Poll job status until every job is terminal or the wait limit is hit
//! 5. **Retrieve**: Download the archives of completed jobs
//! 6. **Unpack**: Extract payload files into the session directory
//! 7. **Report**: Write the session report next to the data
//!
//! # Example
//!
//! ```rust,no_run
//! use vibrent_export::config::{load_config, ClientCredentials};
//! use vibrent_export::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vibrent_export.toml")?;
//! let credentials = ClientCredentials::from_env()?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = ExportCoordinator::new(config, credentials, None, shutdown_rx)?;
//!
//! let report = coordinator.execute_export().await?;
//! println!("Successful: {}", report.successful_exports);
//! println!("Failed: {}", report.failed_exports);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod shutdown;
