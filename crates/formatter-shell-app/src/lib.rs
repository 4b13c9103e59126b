#![warn(missing_docs)]
//! # formatter-shell-app
//!
//! ## Purpose
//! Composition root of the `formatter-shell` desktop process: wires policy,
//! logging, backend supervision, and the bridge contract into one lifecycle.
//!
//! ## Responsibilities
//! - Resolve shell configuration from the environment.
//! - Resolve renderer and splash URLs for the window loader.
//! - Drive the startup sequence: logging, permission handlers, backend
//!   launch, readiness polling.
//! - Serve the three bridge operations and the export-logs flow.
//! - Tear the backend down exactly once at shutdown.
//!
//! ## Data flow
//! [`ShellConfig::from_env`] -> [`DesktopShell::new`] ->
//! [`DesktopShell::run_startup`] launches and polls the bundled backend ->
//! navigation/permission events are judged per request -> bridge requests are
//! answered until [`DesktopShell::shutdown`] stops the backend.
//!
//! ## Ownership and lifetimes
//! The shell owns all process-wide mutable state (supervisor, runtime log,
//! allowed origins) as fields, so tests can construct isolated instances.
//! The window/dialog surface is injected as `Arc<dyn ShellSurface>`.
//!
//! ## Error model
//! Configuration and launch failures surface as [`ShellError`]. Backend
//! launch failures are reported to the user and logged but never abort the
//! shell; export failures are folded into the structured bridge outcome.
//!
//! ## Security and privacy notes
//! - Navigation is allow-listed; blocked http(s) targets leave the shell via
//!   the system browser, never the embedded window.
//! - Every renderer permission request is denied and the denial is logged.
//! - The backend child receives a fully controlled environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use formatter_shell_backend::{
    BackendError, BackendSupervisor, ExitReport, HealthProbe, HttpHealthProbe, LaunchPlan,
    SupervisorEvents, SupervisorState, backend_ready_endpoint, default_readiness_config,
    should_launch_bundled_backend,
};
use formatter_shell_bridge::{BridgeChannel, BridgeError, ExportLogsOutcome, PING_RESPONSE};
use formatter_shell_core::{LogEntry, LogLevel, ReadinessConfig};
use formatter_shell_logging::{RuntimeLog, log_export_default_path};
use formatter_shell_policy::{
    AllowedOrigins, build_allowed_origins, is_navigation_allowed, should_grant_permission,
    should_open_externally,
};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FORMATTER_SHELL_VERSION");

/// Dev server URL used when no override is configured.
pub const DEFAULT_DEV_SERVER_URL: &str = "http://localhost:3000";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Returns the current UTC time as RFC 3339 with millisecond precision.
pub fn now_utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Checks the packaged-mode env override.
///
/// Semantics:
/// - Unset => packaged follows the build profile (release builds are
///   packaged).
/// - `0`, `false`, `off` (case-insensitive) => unpackaged.
/// - Any other value => packaged.
pub fn packaged_from_env() -> bool {
    match std::env::var("FORMATTER_SHELL_PACKAGED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => !cfg!(debug_assertions),
    }
}

/// Immutable shell configuration resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Whether the app runs from a built distribution.
    pub packaged: bool,
    /// Renderer dev server URL used in unpackaged mode.
    pub dev_server_url: String,
    /// Root of bundled resources in packaged installs.
    pub resources_dir: PathBuf,
    /// Root of the development checkout layout.
    pub dev_dir: PathBuf,
    /// Application root containing the built renderer (`out/index.html`).
    pub app_root: PathBuf,
    /// Per-user writable data root (runtime log lives below it).
    pub user_data_dir: PathBuf,
    /// Default directory offered by the export save dialog.
    pub downloads_dir: PathBuf,
    /// Readiness budget for the bundled backend cold start.
    pub readiness: ReadinessConfig,
}

impl ShellConfig {
    /// Resolves configuration from `FORMATTER_SHELL_*` env vars with
    /// executable-relative defaults.
    ///
    /// # Errors
    /// Returns [`ShellError::InstallDir`] when the executable directory
    /// cannot be resolved.
    pub fn from_env() -> Result<Self, ShellError> {
        let install_dir = default_install_dir()?;

        Ok(Self {
            packaged: packaged_from_env(),
            dev_server_url: env_or("FORMATTER_SHELL_RENDERER_URL", DEFAULT_DEV_SERVER_URL),
            resources_dir: dir_from_env(
                "FORMATTER_SHELL_RESOURCES_DIR",
                install_dir.join("resources"),
            ),
            dev_dir: dir_from_env("FORMATTER_SHELL_DEV_DIR", install_dir.clone()),
            app_root: dir_from_env("FORMATTER_SHELL_APP_ROOT", install_dir.clone()),
            user_data_dir: dir_from_env(
                "FORMATTER_SHELL_USER_DATA_DIR",
                install_dir.join("user-data"),
            ),
            downloads_dir: dir_from_env(
                "FORMATTER_SHELL_DOWNLOADS_DIR",
                install_dir.join("downloads"),
            ),
            readiness: default_readiness_config(),
        })
    }
}

fn default_install_dir() -> Result<PathBuf, ShellError> {
    let exe = std::env::current_exe()
        .map_err(|error| ShellError::InstallDir(format!("unable to resolve executable: {error}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ShellError::InstallDir("executable has no parent directory".to_string()))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn dir_from_env(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

/// Snapshots the process environment as the base for the backend launch plan.
///
/// Unix environments may carry non-Unicode bytes; such keys and values are
/// lossy-converted rather than rejected, and the snapshot never fails.
pub fn process_env_snapshot() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

/// Resolves the URL the main window should load.
///
/// Unpackaged installs point at the dev server verbatim; packaged installs
/// load the built renderer from disk.
///
/// # Errors
/// Returns [`ShellError::RendererPath`] when the built renderer path cannot
/// form a `file://` URL.
pub fn renderer_url(config: &ShellConfig) -> Result<String, ShellError> {
    if !config.packaged {
        return Ok(config.dev_server_url.clone());
    }

    let index = config.app_root.join("out").join("index.html");
    Url::from_file_path(&index)
        .map(|url| url.to_string())
        .map_err(|_| ShellError::RendererPath(index))
}

/// Resolves the splash screen URL shown while the backend starts.
///
/// # Errors
/// Returns [`ShellError::RendererPath`] when the splash path cannot form a
/// `file://` URL.
pub fn splash_url(config: &ShellConfig) -> Result<String, ShellError> {
    let splash = config.dev_dir.join("splash.html");
    Url::from_file_path(&splash)
        .map(|url| url.to_string())
        .map_err(|_| ShellError::RendererPath(splash))
}

/// Parameters for the export-logs save dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDialogRequest {
    /// Dialog title.
    pub title: String,
    /// Pre-filled destination path.
    pub default_path: PathBuf,
    /// Permitted file extensions.
    pub extensions: Vec<String>,
}

/// Window, dialog, and browser integration seam.
///
/// The headless binary uses [`ConsoleSurface`]; a real windowing integration
/// implements this against native dialogs. Tests inject recording fakes.
pub trait ShellSurface: Send + Sync {
    /// Shows a blocking error notification.
    fn show_error_box(&self, title: &str, message: &str);

    /// Asks the user for an export destination; `None` means cancelled.
    fn choose_save_path(&self, request: &SaveDialogRequest) -> Option<PathBuf>;

    /// Opens a URL in the platform's external browser.
    ///
    /// # Errors
    /// Returns [`ShellError::OpenExternal`] when the platform opener fails.
    fn open_external(&self, url: &str) -> Result<(), ShellError>;
}

/// Headless surface for terminal sessions.
///
/// Error boxes go to stderr and the save dialog accepts the suggested
/// default path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSurface;

impl ShellSurface for ConsoleSurface {
    fn show_error_box(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }

    fn choose_save_path(&self, request: &SaveDialogRequest) -> Option<PathBuf> {
        Some(request.default_path.clone())
    }

    fn open_external(&self, url: &str) -> Result<(), ShellError> {
        open_external_url(url)
    }
}

/// Opens `url` with the platform launcher after scheme validation.
///
/// # Errors
/// Returns [`ShellError::OpenExternal`] for malformed URLs, unsupported
/// schemes, and launcher failures.
pub fn open_external_url(url: &str) -> Result<(), ShellError> {
    let candidate = url.trim();
    if candidate.is_empty() {
        return Err(ShellError::OpenExternal("missing URL".to_string()));
    }

    let parsed = Url::parse(candidate)
        .map_err(|error| ShellError::OpenExternal(format!("invalid URL: {error}")))?;
    let scheme = parsed.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" && scheme != "mailto" {
        return Err(ShellError::OpenExternal(format!(
            "unsupported URL scheme: {scheme}"
        )));
    }

    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg(candidate).status();
    #[cfg(target_os = "windows")]
    let status = Command::new("cmd")
        .arg("/C")
        .arg("start")
        .arg("")
        .arg(candidate)
        .status();
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let status = Command::new("xdg-open").arg(candidate).status();

    let status = status
        .map_err(|error| ShellError::OpenExternal(format!("failed to open URL: {error}")))?;
    if !status.success() {
        return Err(ShellError::OpenExternal(format!(
            "opener exited with code {}",
            status.code().unwrap_or(-1)
        )));
    }

    Ok(())
}

/// Outcome of one navigation attempt against the origin policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Target is trusted; the window may navigate.
    Proceed,
    /// Target is blocked; the navigation event must be cancelled.
    Cancel,
}

/// Snapshot of what the startup sequence accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Whether the bundled backend process was spawned.
    pub backend_launched: bool,
    /// Readiness poll verdict; `None` when no backend launch was attempted.
    pub backend_ready: Option<bool>,
    /// URL the main window should load.
    pub renderer_url: String,
    /// Splash URL, present only when a backend launch was attempted.
    pub splash_url: Option<String>,
}

struct ShellEvents {
    log: RuntimeLog,
}

impl SupervisorEvents for ShellEvents {
    fn on_exit(&self, report: ExitReport) {
        if !report.unexpected() {
            return;
        }

        let code_text = match report.code {
            Some(code) => code.to_string(),
            None => "none".to_string(),
        };
        let signal_text = match report.signal {
            Some(signal) => signal.to_string(),
            None => "none".to_string(),
        };
        let message =
            format!("Bundled backend exited unexpectedly (code={code_text}, signal={signal_text})");

        self.log.append(
            &LogEntry::new(LogLevel::Error, message.clone(), now_utc_timestamp())
                .with_context("code", report.code)
                .with_context("signal", signal_text),
        );
        eprintln!("{message}");
    }

    fn on_spawn_error(&self, message: &str) {
        self.log.append(
            &LogEntry::new(
                LogLevel::Error,
                "Failed to start bundled backend",
                now_utc_timestamp(),
            )
            .with_context("error", message),
        );
        eprintln!("Failed to start bundled backend: {message}");
    }
}

/// Composition root owning all process-wide shell state.
pub struct DesktopShell {
    config: ShellConfig,
    log: RuntimeLog,
    allowed_origins: AllowedOrigins,
    supervisor: BackendSupervisor,
    surface: Arc<dyn ShellSurface>,
    logging_initialized: bool,
}

impl DesktopShell {
    /// Creates a shell probing the standard backend readiness endpoint.
    ///
    /// # Errors
    /// Returns [`ShellError::Backend`] when the health probe cannot be
    /// constructed.
    pub fn new(config: ShellConfig, surface: Arc<dyn ShellSurface>) -> Result<Self, ShellError> {
        let probe = HttpHealthProbe::new(&backend_ready_endpoint())?;
        Ok(Self::with_probe(config, surface, Arc::new(probe)))
    }

    /// Creates a shell with an injected health probe.
    pub fn with_probe(
        config: ShellConfig,
        surface: Arc<dyn ShellSurface>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let log = RuntimeLog::new(&config.user_data_dir);
        let allowed_origins = build_allowed_origins(config.packaged, &config.dev_server_url);
        let events = Arc::new(ShellEvents { log: log.clone() });
        let base_env = process_env_snapshot();
        let plan = LaunchPlan::bundled_backend(
            config.packaged,
            std::env::consts::OS,
            &config.resources_dir,
            &config.dev_dir,
            &base_env,
        );
        let supervisor = BackendSupervisor::new(plan, probe, events);

        Self {
            config,
            log,
            allowed_origins,
            supervisor,
            surface,
            logging_initialized: false,
        }
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Returns the origins trusted for this window session.
    pub fn allowed_origins(&self) -> &AllowedOrigins {
        &self.allowed_origins
    }

    /// Returns the backend supervisor state.
    pub fn backend_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Returns the runtime log path once logging has been initialized.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.logging_initialized.then(|| self.log.path())
    }

    /// Marks the runtime log live and records the first entry.
    pub fn initialize_logging(&mut self) {
        self.logging_initialized = true;
        self.append(
            LogEntry::new(LogLevel::Info, "Desktop runtime initialized", now_utc_timestamp())
                .with_context("packaged", self.config.packaged),
        );
    }

    /// Runs the startup sequence.
    ///
    /// Initializes logging, then, in packaged mode, launches the bundled
    /// backend and polls it within the configured readiness budget. Launch
    /// failures and timeouts are logged and surfaced as blocking
    /// notifications but never abort the shell; the renderer URL is resolved
    /// regardless so the window can load.
    ///
    /// # Errors
    /// Returns [`ShellError::RendererPath`] when a window URL cannot be
    /// resolved.
    pub async fn run_startup(&mut self) -> Result<StartupReport, ShellError> {
        self.initialize_logging();

        let launch = should_launch_bundled_backend(self.config.packaged);
        let mut backend_launched = false;
        let mut backend_ready = None;
        let mut splash = None;

        if launch {
            splash = Some(splash_url(&self.config)?);

            match self.supervisor.start() {
                Ok(()) => {
                    backend_launched = true;
                    let ready = self.supervisor.wait_until_ready(&self.config.readiness).await;
                    if !ready {
                        let endpoint = backend_ready_endpoint();
                        self.append(
                            LogEntry::new(
                                LogLevel::Error,
                                "Bundled backend startup timeout",
                                now_utc_timestamp(),
                            )
                            .with_context("endpoint", endpoint.clone()),
                        );
                        self.surface.show_error_box(
                            "Backend Startup Timeout",
                            &format!("The bundled API did not become ready at {endpoint}"),
                        );
                    }
                    backend_ready = Some(ready);
                }
                Err(error) => {
                    self.report_runtime_error(
                        "Bundled backend startup failed",
                        &error.to_string(),
                    );
                    self.surface
                        .show_error_box("Bundled Backend Error", &error.to_string());
                }
            }
        }

        Ok(StartupReport {
            backend_launched,
            backend_ready,
            renderer_url: renderer_url(&self.config)?,
            splash_url: splash,
        })
    }

    /// Judges one `will-navigate` style event.
    ///
    /// Blocked targets are logged at warn level; blocked http(s) targets are
    /// bounced to the system browser so disallowed content never renders in
    /// the desktop window.
    pub fn handle_navigation(&self, target_url: &str) -> NavigationDecision {
        if is_navigation_allowed(target_url, &self.allowed_origins) {
            return NavigationDecision::Proceed;
        }

        self.append(
            LogEntry::new(
                LogLevel::Warn,
                "Blocked navigation outside allowlist",
                now_utc_timestamp(),
            )
            .with_context("targetUrl", target_url),
        );

        if should_open_externally(target_url) {
            let _ = self.surface.open_external(target_url);
        }

        NavigationDecision::Cancel
    }

    /// Handles a `window.open` style request: always denied, target bounced
    /// to the system browser.
    pub fn handle_window_open(&self, target_url: &str) {
        let _ = self.surface.open_external(target_url);
    }

    /// Decides one permission request, logging the denial.
    pub fn handle_permission_request(&self, permission: &str) -> bool {
        let granted = should_grant_permission(permission);
        if !granted {
            self.append(
                LogEntry::new(LogLevel::Warn, "Permission request denied", now_utc_timestamp())
                    .with_context("permission", permission),
            );
        }
        granted
    }

    /// Decides one synchronous permission check (no logging).
    pub fn handle_permission_check(&self, permission: &str) -> bool {
        should_grant_permission(permission)
    }

    /// Dispatches one bridge request by channel name.
    ///
    /// # Errors
    /// Returns [`ShellError::Bridge`] for unknown channels or encode
    /// failures; flow-level export failures travel inside the returned value.
    pub fn handle_bridge_request(&self, channel: &str) -> Result<Value, ShellError> {
        match BridgeChannel::parse(channel)? {
            BridgeChannel::Ping => Ok(Value::String(PING_RESPONSE.to_string())),
            BridgeChannel::GetLogFilePath => Ok(match self.log_file_path() {
                Some(path) => Value::String(path.display().to_string()),
                None => Value::Null,
            }),
            BridgeChannel::ExportLogs => {
                let outcome = self.export_runtime_logs();
                serde_json::to_value(&outcome)
                    .map_err(|error| ShellError::Bridge(BridgeError::Encode(error)))
            }
        }
    }

    /// Runs the export-logs flow.
    ///
    /// Missing log file, dialog cancellation, and copy failures all come
    /// back as structured outcomes; this flow never errors across the
    /// bridge boundary.
    pub fn export_runtime_logs(&self) -> ExportLogsOutcome {
        if !self.logging_initialized || !self.log.exists() {
            return ExportLogsOutcome::failed("Runtime logs are not available yet.");
        }

        let request = SaveDialogRequest {
            title: "Export Runtime Logs".to_string(),
            default_path: log_export_default_path(
                &self.config.downloads_dir,
                &now_utc_timestamp(),
            ),
            extensions: vec!["log".to_string(), "txt".to_string()],
        };

        let Some(target) = self.surface.choose_save_path(&request) else {
            return ExportLogsOutcome::cancelled();
        };

        match self.log.export_to(&target) {
            Ok(()) => {
                let target_text = target.display().to_string();
                self.append(
                    LogEntry::new(LogLevel::Info, "Runtime logs exported", now_utc_timestamp())
                        .with_context("filePath", target_text.clone()),
                );
                ExportLogsOutcome::exported(target_text)
            }
            Err(error) => {
                self.report_runtime_error("Failed to export runtime logs", &error.to_string());
                ExportLogsOutcome::failed(error.to_string())
            }
        }
    }

    /// Stops the bundled backend and waits for it to be reaped.
    ///
    /// Safe to call when nothing was launched; the supervisor raises its
    /// intentional-shutdown flag before requesting termination.
    pub async fn shutdown(&mut self) {
        self.supervisor.stop();
        self.supervisor.wait_for_exit().await;
    }

    fn append(&self, entry: LogEntry) {
        if !self.logging_initialized {
            return;
        }
        self.log.append(&entry);
    }

    fn report_runtime_error(&self, message: &str, detail: &str) {
        self.append(
            LogEntry::new(LogLevel::Error, message, now_utc_timestamp())
                .with_context("error", detail),
        );
        eprintln!("{message}: {detail}");
    }
}

/// Shell integration error type.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Backend locator/supervisor error.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    /// Bridge contract error.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),
    /// Executable directory could not be resolved.
    #[error("install directory resolution failed: {0}")]
    InstallDir(String),
    /// Window URL could not be formed from a local path.
    #[error("renderer path cannot form a file URL: {}", .0.display())]
    RendererPath(PathBuf),
    /// Platform browser launcher failed.
    #[error("external open failure: {0}")]
    OpenExternal(String),
}
