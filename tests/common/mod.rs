//! Shared helpers for the integration tests

#![allow(dead_code)]

use mockito::ServerGuard;
use std::io::Write;
use std::path::{Path, PathBuf};
use vibrent_export::config::{parse_config, ExporterConfig};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Token endpoint path served by the mock platform
pub const TOKEN_PATH: &str = "/oauth/token";

/// Configuration pointing at a mock platform, writing below `output_dir`
pub fn config_for(server: &ServerGuard, output_dir: &Path) -> ExporterConfig {
    let toml = format!(
        r#"
[environment]
default = "mock"

[environment.environments.mock]
base_url = "{base}"
token_url = "{base}{token}"

[export.request]
submission_delay_ms = 0

[export.monitoring]
polling_interval_seconds = 1

[output]
base_directory = "{output}"

"#,
        base = server.url(),
        token = TOKEN_PATH,
        output = output_dir.display().to_string().replace('\\', "/"),
    );
    parse_config(&toml, |_| None).expect("test configuration must parse")
}

/// Serve a token that stays valid for an hour
pub async fn mock_token(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"test-token","expires_in":3600}"#)
        .create_async()
        .await
}

/// Zip archive holding `entries` (name, contents), stored uncompressed
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

/// Write a zip archive to `path`
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) -> PathBuf {
    std::fs::write(path, zip_bytes(entries)).unwrap();
    path.to_path_buf()
}

/// Every regular file directly inside `dir`, by name
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
