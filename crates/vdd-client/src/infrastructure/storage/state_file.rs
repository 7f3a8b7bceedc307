//! JSON file holding a committed monitor list.
//!
//! The file is a plain array of monitor records, the same shape the driver
//! replies with:
//!
//! ```json
//! [
//!   { "id": 0, "name": "desk", "enabled": true,
//!     "modes": [ { "width": 1920, "height": 1080, "refresh_rates": [60] } ] }
//! ]
//! ```
//!
//! Loading goes through the loose record builder in `vdd_core`, so a
//! hand-edited file with a bad field is reported with the field's path
//! (for example `[1].modes[0].width`) instead of a generic parse error.
//!
//! Writes go to a sibling temporary file first and are renamed into place, so
//! a crash mid-write leaves the previous state intact.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use vdd_core::protocol::records_from_json_str;
use vdd_core::{MonitorRecord, RecordError};

/// Error type for state file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold a valid monitor list.
    #[error("state file {path} is invalid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    /// The monitor list could not be serialized.
    #[error("failed to serialize driver state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A monitor list persisted at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored monitor list.
    ///
    /// A missing file is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for file-system errors other than "not
    /// found", and [`StorageError::Parse`] if the content is not a valid
    /// monitor list.
    pub fn load(&self) -> Result<Vec<MonitorRecord>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let records = records_from_json_str(&content).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), monitors = records.len(), "state file loaded");
        Ok(records)
    }

    /// Replaces the stored monitor list.
    ///
    /// Creates the parent directory if needed.
    pub fn save(&self, monitors: &[MonitorRecord]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(monitors)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), monitors = monitors.len(), "state file saved");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
