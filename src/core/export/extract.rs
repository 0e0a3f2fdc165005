//! Archive unpacking
//!
//! Downloaded exports are zip archives. Only payload entries (`.json` for JSON
//! exports, `.csv` for CSV exports) are written to the session directory.
//! Extraction is synchronous; callers on the runtime use `spawn_blocking`.

use crate::domain::{ExportFormat, ExtractionError};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Outcome of unpacking a set of archives
#[derive(Debug, Default)]
pub struct ExtractionSummary {
    /// Archives unpacked without error
    pub archives_extracted: usize,

    /// Files written, across all archives
    pub files: Vec<PathBuf>,

    /// Archives deleted after extraction
    pub archives_removed: usize,

    /// One entry per archive that could not be fully unpacked
    pub errors: Vec<ExtractionError>,
}

/// Unpacks payload files from export archives
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    output_dir: PathBuf,
    format: ExportFormat,
    remove_after_extract: bool,
}

impl ArchiveExtractor {
    /// Create an extractor writing into `output_dir`
    pub fn new(
        output_dir: impl Into<PathBuf>,
        format: ExportFormat,
        remove_after_extract: bool,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            remove_after_extract,
        }
    }

    /// Unpack every archive in `archives`
    ///
    /// Errors are logged and collected; a bad archive never stops the next
    /// one from being processed and is never deleted.
    pub fn extract_all(&self, archives: &[PathBuf]) -> ExtractionSummary {
        let mut summary = ExtractionSummary::default();

        for archive in archives {
            match self.extract(archive) {
                Ok(files) => {
                    tracing::info!(
                        archive = %archive.display(),
                        files = files.len(),
                        "Archive extracted"
                    );
                    summary.archives_extracted += 1;
                    summary.files.extend(files);

                    if self.remove_after_extract {
                        match fs::remove_file(archive) {
                            Ok(()) => summary.archives_removed += 1,
                            Err(e) => tracing::warn!(
                                archive = %archive.display(),
                                error = %e,
                                "Failed to remove extracted archive"
                            ),
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(archive = %archive.display(), error = %e, "Extraction failed");
                    summary.errors.push(e);
                }
            }
        }

        summary
    }

    /// Unpack one archive, returning the files written
    fn extract(&self, archive_path: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let invalid = |reason: String| ExtractionError::InvalidArchive {
            archive: archive_path.to_path_buf(),
            reason,
        };

        let file = File::open(archive_path).map_err(|e| invalid(format!("failed to open: {e}")))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| invalid(format!("failed to read zip: {e}")))?;

        let wanted = self.format.extension();
        let mut written = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| invalid(format!("failed to read entry {index}: {e}")))?;

            if entry.is_dir() {
                continue;
            }

            let relative = match entry.enclosed_name() {
                Some(path) => path.to_path_buf(),
                None => {
                    tracing::warn!(entry = %entry.name(), "Skipping entry with unsafe path");
                    continue;
                }
            };

            let matches_format = relative
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                .unwrap_or(false);
            if !matches_format {
                tracing::debug!(entry = %entry.name(), "Skipping non-payload entry");
                continue;
            }

            let entry_error = |reason: String| ExtractionError::Entry {
                archive: archive_path.to_path_buf(),
                entry: relative.display().to_string(),
                reason,
            };

            let dest = self.output_dir.join(&relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| entry_error(format!("failed to create directory: {e}")))?;
            }

            let mut outfile =
                File::create(&dest).map_err(|e| entry_error(format!("failed to create file: {e}")))?;
            io::copy(&mut entry, &mut outfile)
                .map_err(|e| entry_error(format!("failed to write file: {e}")))?;

            written.push(dest);
        }

        Ok(written)
    }
}
