//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ExporterConfig;
use crate::domain::errors::ExporterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ExporterConfig`]
/// 4. Applies environment variable overrides (`VIBRENT_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Every failure is reported as [`ExporterError::Configuration`].
///
/// # Examples
///
/// ```no_run
/// use vibrent_export::config::load_config;
///
/// let config = load_config("vibrent_export.toml").expect("Failed to load config");
/// println!("default environment: {}", config.environment.default);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExporterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExporterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents, |name| std::env::var(name).ok())
}

/// Parses configuration text, resolving variables through `lookup`
pub fn parse_config<F>(contents: &str, lookup: F) -> Result<ExporterConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let contents = substitute_env_vars(contents, &lookup)?;

    let mut config: ExporterConfig = toml::from_str(&contents)
        .map_err(|e| ExporterError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config, &lookup)?;

    config.validate().map_err(|e| {
        ExporterError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Every referenced variable that is not
/// set is reported in a single error.
fn substitute_env_vars<F>(input: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExporterError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match lookup(var_name) {
                Some(value) => value,
                None => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(ExporterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ExporterError::Configuration(format!("Invalid value for {name}: {e}")))
}

/// Applies environment variable overrides using the `VIBRENT_*` prefix
///
/// Variables follow the pattern `VIBRENT_<SECTION>_<KEY>`, for example
/// `VIBRENT_API_TIMEOUT_SECONDS` or `VIBRENT_OUTPUT_BASE_DIRECTORY`.
fn apply_env_overrides<F>(config: &mut ExporterConfig, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    macro_rules! override_with {
        ($name:literal, $target:expr) => {
            if let Some(val) = lookup($name) {
                $target = parse_override($name, &val)?;
            }
        };
    }

    override_with!("VIBRENT_APPLICATION_LOG_LEVEL", config.application.log_level);
    override_with!("VIBRENT_ENVIRONMENT_DEFAULT", config.environment.default);

    override_with!("VIBRENT_AUTH_TIMEOUT_SECONDS", config.auth.timeout_seconds);
    override_with!(
        "VIBRENT_AUTH_REFRESH_BUFFER_SECONDS",
        config.auth.refresh_buffer_seconds
    );
    override_with!("VIBRENT_API_TIMEOUT_SECONDS", config.api.timeout_seconds);

    override_with!("VIBRENT_EXPORT_FORMAT", config.export.format);
    override_with!(
        "VIBRENT_EXPORT_DEFAULT_DAYS_BACK",
        config.export.date_range.default_days_back
    );
    if let Some(val) = lookup("VIBRENT_EXPORT_MAX_SURVEYS") {
        config.export.request.max_surveys =
            Some(parse_override("VIBRENT_EXPORT_MAX_SURVEYS", &val)?);
    }
    override_with!(
        "VIBRENT_EXPORT_POLLING_INTERVAL_SECONDS",
        config.export.monitoring.polling_interval_seconds
    );
    if let Some(val) = lookup("VIBRENT_EXPORT_MAX_WAIT_SECONDS") {
        config.export.monitoring.max_wait_seconds =
            Some(parse_override("VIBRENT_EXPORT_MAX_WAIT_SECONDS", &val)?);
    }
    override_with!(
        "VIBRENT_EXPORT_CONTINUE_ON_FAILURE",
        config.export.monitoring.continue_on_failure
    );

    override_with!("VIBRENT_OUTPUT_BASE_DIRECTORY", config.output.base_directory);
    override_with!("VIBRENT_OUTPUT_EXTRACT_FILES", config.output.extract_files);

    override_with!("VIBRENT_METADATA_SAVE_METADATA", config.metadata.save_metadata);

    override_with!("VIBRENT_LOGGING_LOCAL_ENABLED", config.logging.local_enabled);
    override_with!("VIBRENT_LOGGING_LOCAL_PATH", config.logging.local_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExportFormat;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[environment]
default = "staging"

[environment.environments.staging]
base_url = "https://staging.example.com"
token_url = "https://auth.example.com/token"
"#;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_substitute_env_vars() {
        let lookup = vars(&[("TEST_VAR", "test_value")]);
        let result = substitute_env_vars("password = \"${TEST_VAR}\"", &lookup).unwrap();
        assert_eq!(result, "password = \"test_value\"");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let lookup = vars(&[]);
        let err = substitute_env_vars("a = \"${MISSING_A}\"\nb = \"${MISSING_B}\"", &lookup)
            .unwrap_err();
        assert!(err.to_string().contains("MISSING_A, MISSING_B"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let lookup = vars(&[]);
        let result = substitute_env_vars("# token = \"${NOT_SET}\"", &lookup).unwrap();
        assert_eq!(result, "# token = \"${NOT_SET}\"");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_vibrent_export.toml");
        assert!(matches!(result, Err(ExporterError::Configuration(_))));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(MINIMAL, vars(&[])).unwrap();
        assert_eq!(config.environment.default, "staging");
        assert_eq!(config.export.format, ExportFormat::Json);
        assert_eq!(config.auth.refresh_buffer_seconds, 300);
    }

    #[test]
    fn test_parse_with_substitution() {
        let contents = r#"
[environment]
default = "production"

[environment.environments.production]
base_url = "${PROD_BASE_URL}"
token_url = "https://auth.example.com/token"
"#;
        let config =
            parse_config(contents, vars(&[("PROD_BASE_URL", "https://api.example.com")])).unwrap();
        let (_, endpoints) = config.environment.resolve(None).unwrap();
        assert_eq!(endpoints.base_url, "https://api.example.com");
    }

    #[test]
    fn test_env_overrides() {
        let config = parse_config(
            MINIMAL,
            vars(&[
                ("VIBRENT_EXPORT_FORMAT", "csv"),
                ("VIBRENT_EXPORT_MAX_WAIT_SECONDS", "600"),
                ("VIBRENT_OUTPUT_BASE_DIRECTORY", "/tmp/exports"),
                ("VIBRENT_EXPORT_CONTINUE_ON_FAILURE", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(config.export.format, ExportFormat::Csv);
        assert_eq!(config.export.monitoring.max_wait_seconds, Some(600));
        assert_eq!(config.output.base_directory, PathBuf::from("/tmp/exports"));
        assert!(!config.export.monitoring.continue_on_failure);
    }

    #[test]
    fn test_invalid_override_is_error() {
        let err = parse_config(MINIMAL, vars(&[("VIBRENT_API_TIMEOUT_SECONDS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("VIBRENT_API_TIMEOUT_SECONDS"));
    }

    #[test]
    fn test_validation_failure_is_configuration_error() {
        let contents = format!("{MINIMAL}\n[export.monitoring]\npolling_interval_seconds = 0\n");
        let err = parse_config(&contents, vars(&[])).unwrap_err();
        assert!(matches!(err, ExporterError::Configuration(_)));
        assert!(err.to_string().contains("polling_interval_seconds"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.environment.names(), vec!["staging"]);
    }
}
