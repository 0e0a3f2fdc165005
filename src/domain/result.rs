//! Result type alias for the exporter

use super::errors::ExporterError;

/// Result type alias for exporter operations
///
/// # Examples
///
/// ```
/// use vibrent_export::domain::result::Result;
/// use vibrent_export::domain::errors::ExporterError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExporterError::Configuration("missing token_url".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExporterError>;
