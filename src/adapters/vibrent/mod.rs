//! Vibrent Health platform adapter
//!
//! This module provides the integration with the platform's external API:
//! the OAuth2 token provider, the [`ExportApi`] gateway trait with its HTTP
//! implementation, and the wire models of the fixed-shape responses.

pub mod auth;
pub mod client;
pub mod models;

pub use auth::{Credential, TokenProvider};
pub use client::{download_file_name, ExportApi, VibrentClient};
