//! External system integrations.
//!
//! - [`vibrent`] - Vibrent Health platform API (token lifecycle, survey
//!   listing, export jobs, artifact download)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies.
//! The export pipeline only sees the [`vibrent::ExportApi`] trait, so tests
//! drive it with scripted implementations instead of a live server.
//!
//! ```rust,no_run
//! use vibrent_export::adapters::vibrent::{ExportApi, VibrentClient};
//! use vibrent_export::config::{load_config, ClientCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vibrent_export.toml")?;
//! let (_, endpoints) = config.environment.resolve(None)?;
//! let client = VibrentClient::new(
//!     endpoints,
//!     ClientCredentials::from_env()?,
//!     &config.auth,
//!     &config.api,
//! )?;
//! let surveys = client.list_surveys().await?;
//! println!("{} surveys", surveys.len());
//! # Ok(())
//! # }
//! ```

pub mod vibrent;
