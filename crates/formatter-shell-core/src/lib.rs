#![warn(missing_docs)]
//! # formatter-shell-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `formatter-shell` workspace.
//!
//! ## Responsibilities
//! - Represent structured runtime log entries and their levels.
//! - Encode/decode log entries as newline-delimited JSON records.
//! - Validate readiness-poll configuration used by backend supervision.
//!
//! ## Data flow
//! Shell components emit [`LogEntry`] values; the logging layer serializes
//! each entry with [`LogEntry::to_json_line`] and appends it to the runtime
//! log file. Diagnostic tooling reads the file back one line at a time with
//! [`LogEntry::from_json_line`].
//!
//! ## Ownership and lifetimes
//! Entries own their message and context values (`String`/`serde_json::Value`)
//! so they can outlive the call site that produced them.
//!
//! ## Error model
//! Validation failures (non-positive or overflowing poll budget) and codec
//! failures return [`CoreError`] variants with caller-actionable
//! categorization.
//!
//! ## Security and privacy notes
//! This crate never writes to disk or the network; callers decide where
//! serialized entries go. Context values are treated as opaque JSON.
//!
//! ## Example
//! ```rust
//! use formatter_shell_core::{LogEntry, LogLevel};
//!
//! let entry = LogEntry::new(LogLevel::Info, "ready", "2026-02-09T12:00:00.000Z")
//!     .with_context("attempt", 1);
//! let line = entry.to_json_line().expect("entry should encode");
//! assert!(line.ends_with('\n'));
//! assert_eq!(LogEntry::from_json_line(&line).unwrap(), entry);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Severity of one runtime log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine lifecycle information.
    Info,
    /// Recoverable or policy-relevant anomaly.
    Warn,
    /// Failure that needs operator attention.
    Error,
}

/// One structured runtime log record.
///
/// Serialized as a single JSON object per line with exactly the four fields
/// below, in declaration order. The on-disk format is append-only NDJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogEntry {
    /// Entry severity.
    pub level: LogLevel,
    /// Human-readable event description.
    pub message: String,
    /// RFC 3339 timestamp string, preserved exactly as supplied.
    pub timestamp: String,
    /// Arbitrary key/value payload attached by the call site.
    pub context: Map<String, Value>,
}

impl LogEntry {
    /// Constructs an entry with an empty context map.
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: timestamp.into(),
            context: Map::new(),
        }
    }

    /// Returns the entry with one context key attached.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Serializes the entry as one newline-terminated JSON line.
    ///
    /// `serde_json` escapes embedded newlines inside string values, so the
    /// output always occupies exactly one line.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_line(&self) -> Result<String, CoreError> {
        let mut line = serde_json::to_string(self).map_err(CoreError::Codec)?;
        line.push('\n');
        Ok(line)
    }

    /// Deserializes one entry from a single NDJSON line.
    ///
    /// The trailing newline is optional; embedded content is parsed strictly
    /// against the four-field record shape.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when the line is not a valid entry.
    pub fn from_json_line(line: &str) -> Result<Self, CoreError> {
        serde_json::from_str(line.trim_end_matches('\n')).map_err(CoreError::Codec)
    }
}

/// Bounded retry budget for backend readiness polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Number of health-probe attempts before giving up.
    pub attempts: u32,
    /// Suspension between attempts, in milliseconds.
    pub interval_ms: u64,
}

impl ReadinessConfig {
    /// Constructs a validated readiness budget.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidAttempts`] when `attempts == 0`.
    /// Returns [`CoreError::InvalidIntervalMs`] when `interval_ms == 0`.
    pub fn new(attempts: u32, interval_ms: u64) -> Result<Self, CoreError> {
        if attempts == 0 {
            return Err(CoreError::InvalidAttempts);
        }
        if interval_ms == 0 {
            return Err(CoreError::InvalidIntervalMs);
        }

        Ok(Self {
            attempts,
            interval_ms,
        })
    }

    /// Returns the total wall-clock budget covered by this configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::BudgetOverflow`] when `attempts * interval_ms`
    /// does not fit in a `u64` millisecond count.
    pub fn total_budget_ms(&self) -> Result<u64, CoreError> {
        u64::from(self.attempts)
            .checked_mul(self.interval_ms)
            .ok_or(CoreError::BudgetOverflow)
    }
}

/// Error type for core model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Readiness attempts must be strictly positive.
    #[error("readiness attempts must be greater than zero")]
    InvalidAttempts,
    /// Readiness interval must be strictly positive.
    #[error("readiness interval must be greater than zero")]
    InvalidIntervalMs,
    /// Readiness budget exceeds the representable millisecond range.
    #[error("readiness budget overflows the millisecond range")]
    BudgetOverflow,
    /// JSON encoding/decoding error.
    #[error("log entry codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
