#![warn(missing_docs)]
//! # formatter-shell-bridge
//!
//! ## Purpose
//! Defines the privileged request/response contract between the rendered UI
//! and the desktop shell.
//!
//! ## Responsibilities
//! - Name the three bridge channels and parse incoming channel identifiers.
//! - Model the structured export-logs outcome exactly as the renderer
//!   expects it on the wire.
//! - Expose the renderer-facing constants (API base URL, host platform).
//!
//! ## Data flow
//! Renderer request -> [`BridgeChannel::parse`] -> shell dispatch -> response
//! payload serialized back across the boundary.
//!
//! ## Ownership and lifetimes
//! Wire types are owned structs; nothing borrows from the transport buffer.
//!
//! ## Error model
//! Unknown channels return [`BridgeError::UnknownChannel`]. Export failures
//! are carried as data inside [`ExportLogsOutcome`], never as errors thrown
//! across the boundary.
//!
//! ## Security and privacy notes
//! These three operations are the only privileged calls the renderer may
//! make; anything else must be rejected at parse time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel name for the liveness ping.
pub const CHANNEL_PING: &str = "desktop:ping";
/// Channel name for querying the runtime log file path.
pub const CHANNEL_GET_LOG_FILE_PATH: &str = "desktop:get-log-file-path";
/// Channel name for the export-logs flow.
pub const CHANNEL_EXPORT_LOGS: &str = "desktop:export-logs";
/// Fixed response to a ping request.
pub const PING_RESPONSE: &str = "pong";
/// Backend base URL handed to the renderer.
pub const API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Returns the host platform identifier exposed to the renderer.
pub fn host_platform() -> &'static str {
    std::env::consts::OS
}

/// The three privileged operations the renderer may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeChannel {
    /// `desktop:ping` -> `"pong"`.
    Ping,
    /// `desktop:get-log-file-path` -> log path or null.
    GetLogFilePath,
    /// `desktop:export-logs` -> [`ExportLogsOutcome`].
    ExportLogs,
}

impl BridgeChannel {
    /// Returns the wire name of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => CHANNEL_PING,
            Self::GetLogFilePath => CHANNEL_GET_LOG_FILE_PATH,
            Self::ExportLogs => CHANNEL_EXPORT_LOGS,
        }
    }

    /// Parses a wire channel name.
    ///
    /// # Errors
    /// Returns [`BridgeError::UnknownChannel`] for anything outside the
    /// three-operation surface.
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        match raw {
            CHANNEL_PING => Ok(Self::Ping),
            CHANNEL_GET_LOG_FILE_PATH => Ok(Self::GetLogFilePath),
            CHANNEL_EXPORT_LOGS => Ok(Self::ExportLogs),
            other => Err(BridgeError::UnknownChannel(other.to_string())),
        }
    }
}

/// Structured result of one export-logs request.
///
/// Optional members are omitted from the wire entirely when absent; the
/// renderer distinguishes cancellation from failure by key presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportLogsOutcome {
    /// Whether the export completed.
    pub ok: bool,
    /// Destination path of the exported file, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Present and `true` when the user dismissed the save dialog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    /// Failure description, present when the export could not complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportLogsOutcome {
    /// Successful export to `file_path`.
    pub fn exported(file_path: impl Into<String>) -> Self {
        Self {
            ok: true,
            file_path: Some(file_path.into()),
            cancelled: None,
            error: None,
        }
    }

    /// User dismissed the save dialog.
    pub fn cancelled() -> Self {
        Self {
            ok: false,
            file_path: None,
            cancelled: Some(true),
            error: None,
        }
    }

    /// Export failed with a caller-visible reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            file_path: None,
            cancelled: None,
            error: Some(reason.into()),
        }
    }

    /// Serializes the outcome for the wire.
    ///
    /// # Errors
    /// Returns [`BridgeError::Encode`] when JSON serialization fails.
    pub fn to_json(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(BridgeError::Encode)
    }
}

/// Bridge contract errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Channel name outside the privileged surface.
    #[error("unknown bridge channel: {0}")]
    UnknownChannel(String),
    /// JSON encode failure.
    #[error("bridge encode failure: {0}")]
    Encode(#[from] serde_json::Error),
}
