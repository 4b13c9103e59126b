#![warn(missing_docs)]
//! # formatter-shell-logging
//!
//! ## Purpose
//! Persists structured runtime log entries for the `formatter-shell` desktop
//! process and resolves the log-related filesystem paths.
//!
//! ## Responsibilities
//! - Resolve the runtime log file path and the default export path.
//! - Append one NDJSON line per entry, creating parent directories on demand.
//! - Copy the log file to a caller-chosen export target.
//!
//! ## Data flow
//! The composition root constructs one [`RuntimeLog`] at startup -> shell
//! components hand it [`LogEntry`] values -> each entry is appended as one
//! line to `<user data>/logs/runtime.log` -> the export flow copies that file
//! into the user's downloads directory.
//!
//! ## Ownership and lifetimes
//! [`RuntimeLog`] owns its resolved path; the path is fixed at construction
//! and never changes for the remainder of the process lifetime.
//!
//! ## Error model
//! [`RuntimeLog::append`] never propagates failures; a write that cannot be
//! persisted is reported on stderr so logging can never crash the feature it
//! instruments. Export failures return [`LoggingError`] for the caller to
//! fold into its structured result.
//!
//! ## Security and privacy notes
//! The log file is append-only and never truncated or rotated by this layer.
//! Entry content is chosen by callers; nothing is redacted here.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use formatter_shell_core::{CoreError, LogEntry};
use thiserror::Error;

/// File-name slug identifying the product in exported artifacts.
pub const APP_SLUG: &str = "ai-report-formatter";

/// Returns the runtime log file path under the user-data root.
pub fn runtime_log_file_path(user_data_root: &Path) -> PathBuf {
    user_data_root.join("logs").join("runtime.log")
}

/// Returns the default export target for the given timestamp.
///
/// Colons in the timestamp are replaced with dashes so the file name stays
/// legal on every supported filesystem.
pub fn log_export_default_path(downloads_root: &Path, timestamp: &str) -> PathBuf {
    let sanitized = timestamp.replace(':', "-");
    downloads_root.join(format!("{APP_SLUG}-runtime-{sanitized}.log"))
}

/// Append-only writer for the runtime log file.
#[derive(Debug, Clone)]
pub struct RuntimeLog {
    path: PathBuf,
}

impl RuntimeLog {
    /// Creates a writer rooted under `user_data_root`.
    pub fn new(user_data_root: &Path) -> Self {
        Self {
            path: runtime_log_file_path(user_data_root),
        }
    }

    /// Returns the resolved log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` when the log file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Appends one entry as a single NDJSON line.
    ///
    /// Failures are reported on stderr and swallowed; a broken log sink must
    /// never take down the operation that tried to log.
    pub fn append(&self, entry: &LogEntry) {
        if let Err(error) = self.try_append(entry) {
            eprintln!("Failed to persist runtime log: {error}");
        }
    }

    fn try_append(&self, entry: &LogEntry) -> Result<(), LoggingError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let line = entry.to_json_line()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Copies the log file to `target`.
    ///
    /// # Errors
    /// Returns [`LoggingError::Io`] when the source is missing or the copy
    /// fails.
    pub fn export_to(&self, target: &Path) -> Result<(), LoggingError> {
        fs::copy(&self.path, target)?;
        Ok(())
    }
}

/// Error type for log persistence and export failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Entry could not be encoded as JSON.
    #[error("log entry codec failure: {0}")]
    Codec(#[from] CoreError),
    /// Filesystem operation failed.
    #[error("log file I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
