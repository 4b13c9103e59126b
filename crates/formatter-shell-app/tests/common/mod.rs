//! Shared fixtures for app integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use formatter_shell_app::{SaveDialogRequest, ShellConfig, ShellError, ShellSurface};
use formatter_shell_backend::{HealthProbe, default_readiness_config};
use formatter_shell_core::LogEntry;
use futures_util::future::BoxFuture;

/// Creates a unique writable directory under the system temp root.
#[allow(dead_code)]
pub fn test_temp_dir(suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "formatter-shell-{suffix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&path).expect("temp dir");
    path
}

/// Builds a shell configuration rooted inside one temp directory.
#[allow(dead_code)]
pub fn fixture_config(root: &Path, packaged: bool) -> ShellConfig {
    ShellConfig {
        packaged,
        dev_server_url: "http://localhost:3000".to_string(),
        resources_dir: root.join("resources"),
        dev_dir: root.join("dev"),
        app_root: root.join("app"),
        user_data_dir: root.join("user-data"),
        downloads_dir: root.join("downloads"),
        readiness: default_readiness_config(),
    }
}

/// Reads the runtime log and parses every NDJSON line.
#[allow(dead_code)]
pub fn read_log_entries(path: &Path) -> Vec<LogEntry> {
    let raw = fs::read_to_string(path).expect("runtime log should be readable");
    raw.lines()
        .map(|line| LogEntry::from_json_line(line).expect("log line should parse"))
        .collect()
}

/// Probe fake that never observes a healthy backend.
#[allow(dead_code)]
pub struct NeverReadyProbe;

impl HealthProbe for NeverReadyProbe {
    fn check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { false })
    }
}

/// Probe fake that reports readiness immediately.
#[allow(dead_code)]
pub struct ReadyProbe;

impl HealthProbe for ReadyProbe {
    fn check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}

/// Scripted save-dialog behavior for [`RecordingSurface`].
#[allow(dead_code)]
pub enum SaveChoice {
    /// Accept the dialog's suggested default path.
    AcceptDefault,
    /// Pick an explicit destination.
    Target(PathBuf),
    /// Dismiss the dialog.
    Cancel,
}

/// Surface fake that records every interaction.
#[allow(dead_code)]
pub struct RecordingSurface {
    pub save_choice: SaveChoice,
    pub error_boxes: Mutex<Vec<(String, String)>>,
    pub opened_urls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingSurface {
    pub fn new(save_choice: SaveChoice) -> Self {
        Self {
            save_choice,
            error_boxes: Mutex::new(Vec::new()),
            opened_urls: Mutex::new(Vec::new()),
        }
    }

    pub fn error_titles(&self) -> Vec<String> {
        self.error_boxes
            .lock()
            .expect("error box lock should work")
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened_urls
            .lock()
            .expect("opened url lock should work")
            .clone()
    }
}

impl ShellSurface for RecordingSurface {
    fn show_error_box(&self, title: &str, message: &str) {
        self.error_boxes
            .lock()
            .expect("error box lock should work")
            .push((title.to_string(), message.to_string()));
    }

    fn choose_save_path(&self, request: &SaveDialogRequest) -> Option<PathBuf> {
        match &self.save_choice {
            SaveChoice::AcceptDefault => Some(request.default_path.clone()),
            SaveChoice::Target(path) => Some(path.clone()),
            SaveChoice::Cancel => None,
        }
    }

    fn open_external(&self, url: &str) -> Result<(), ShellError> {
        self.opened_urls
            .lock()
            .expect("opened url lock should work")
            .push(url.to_string());
        Ok(())
    }
}
