#![warn(missing_docs)]
//! # formatter-shell-backend
//!
//! ## Purpose
//! Locates, launches, health-polls, and tears down the bundled HTTP backend
//! that performs the actual report formatting.
//!
//! ## Responsibilities
//! - Resolve the platform-specific backend executable path.
//! - Construct the backend process environment.
//! - Supervise the spawned process: start, bounded readiness polling, stop,
//!   and exit reporting through named observer callbacks.
//!
//! ## Data flow
//! The composition root builds a [`LaunchPlan`] -> [`BackendSupervisor::start`]
//! spawns the child and hands it to a monitor task ->
//! [`BackendSupervisor::wait_until_ready`] polls `GET /healthz` within the
//! configured budget -> [`BackendSupervisor::stop`] requests termination
//! during shutdown, flagging the exit as intentional first.
//!
//! ## Ownership and lifetimes
//! The child process handle is owned exclusively by the monitor task; no
//! other component can signal or inspect it directly. Observers and probes
//! are shared as `Arc<dyn ...>` so tests can inject scripted behavior.
//!
//! ## Error model
//! Launch failures return [`BackendError`] and are surfaced to the user by
//! the caller. Probe failures are never errors; a failed attempt simply
//! counts against the readiness budget.
//!
//! ## Security and privacy notes
//! The backend binds to loopback only; host, port, and the CORS-disable
//! sentinel are forced into the child environment regardless of caller input.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use formatter_shell_core::ReadinessConfig;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

/// Loopback host the bundled backend binds to.
pub const DESKTOP_API_HOST: &str = "127.0.0.1";
/// Fixed port the bundled backend binds to.
pub const DESKTOP_API_PORT: &str = "8000";
/// Sentinel value disabling extra CORS origins in the backend.
pub const API_CORS_EXTRA_ORIGINS_DISABLED: &str = "null";
/// Liveness endpoint path exposed by the backend.
pub const BACKEND_READY_PATH: &str = "/healthz";
/// Default number of readiness probe attempts.
pub const BACKEND_READY_ATTEMPTS: u32 = 120;
/// Default suspension between readiness probes, in milliseconds.
pub const BACKEND_READY_INTERVAL_MS: u64 = 500;
/// Per-probe network timeout, kept below the inter-attempt interval.
pub const BACKEND_PROBE_TIMEOUT_MS: u64 = 400;

/// Returns the backend base URL served on loopback.
pub fn api_base_url() -> String {
    format!("http://{DESKTOP_API_HOST}:{DESKTOP_API_PORT}")
}

/// Returns the full readiness endpoint URL.
pub fn backend_ready_endpoint() -> String {
    format!("{}{BACKEND_READY_PATH}", api_base_url())
}

/// Returns the default readiness budget for a bundled backend cold start.
///
/// 120 attempts x 500 ms covers at least the contractual 45 second cold
/// start window.
pub fn default_readiness_config() -> ReadinessConfig {
    ReadinessConfig {
        attempts: BACKEND_READY_ATTEMPTS,
        interval_ms: BACKEND_READY_INTERVAL_MS,
    }
}

/// Returns the platform-specific backend binary name.
///
/// `platform` follows `std::env::consts::OS` naming; only `"windows"`
/// carries an `.exe` suffix.
pub fn backend_binary_name(platform: &str) -> &'static str {
    if platform == "windows" {
        "api-server.exe"
    } else {
        "api-server"
    }
}

/// Resolves the backend executable path for the current install layout.
///
/// Packaged installs resolve under `resources_dir`, development checkouts
/// under `dev_dir`. Pure path arithmetic; existence is checked by the
/// launch path, not here.
pub fn backend_executable_path(
    packaged: bool,
    platform: &str,
    resources_dir: &Path,
    dev_dir: &Path,
) -> PathBuf {
    let root = if packaged { resources_dir } else { dev_dir };
    root.join("backend").join(backend_binary_name(platform))
}

/// Builds the child process environment for the bundled backend.
///
/// The three desktop keys are forced over any caller-supplied values; every
/// other `base` key passes through unchanged.
pub fn build_backend_env(base: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut env = base.clone();
    env.insert("DESKTOP_API_HOST".to_string(), DESKTOP_API_HOST.to_string());
    env.insert("DESKTOP_API_PORT".to_string(), DESKTOP_API_PORT.to_string());
    env.insert(
        "API_CORS_EXTRA_ORIGINS".to_string(),
        API_CORS_EXTRA_ORIGINS_DISABLED.to_string(),
    );
    env
}

/// Returns `true` when this install should spawn the bundled backend.
///
/// Development checkouts run the backend out-of-process by hand.
pub fn should_launch_bundled_backend(packaged: bool) -> bool {
    packaged
}

/// Everything needed to spawn one backend process.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Executable to spawn.
    pub executable: PathBuf,
    /// Command-line arguments, empty for the bundled backend.
    pub args: Vec<String>,
    /// Complete child environment; the child inherits nothing else.
    pub env: BTreeMap<String, String>,
    /// Discard child stdio instead of inheriting the shell's descriptors.
    pub quiet_stdio: bool,
}

impl LaunchPlan {
    /// Builds the standard plan for the bundled backend.
    pub fn bundled_backend(
        packaged: bool,
        platform: &str,
        resources_dir: &Path,
        dev_dir: &Path,
        base_env: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            executable: backend_executable_path(packaged, platform, resources_dir, dev_dir),
            args: Vec::new(),
            env: build_backend_env(base_env),
            quiet_stdio: packaged,
        }
    }
}

/// Trait implemented by concrete health probes.
pub trait HealthProbe: Send + Sync {
    /// Issues one liveness check.
    ///
    /// `true` means a 2xx response was observed; transport failures and
    /// non-2xx statuses both report `false` and are never surfaced as errors.
    fn check(&self) -> BoxFuture<'_, bool>;
}

/// HTTP health probe against the backend readiness endpoint.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpHealthProbe {
    /// Creates a probe for `endpoint` with the fixed per-probe timeout.
    ///
    /// # Errors
    /// Returns [`BackendError::InvalidEndpoint`] when `endpoint` is not a
    /// URL, or [`BackendError::HealthClient`] when the HTTP client cannot be
    /// constructed.
    pub fn new(endpoint: &str) -> Result<Self, BackendError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|error| BackendError::InvalidEndpoint(format!("{endpoint}: {error}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(BACKEND_PROBE_TIMEOUT_MS))
            .build()
            .map_err(|error| BackendError::HealthClient(error.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

impl HealthProbe for HttpHealthProbe {
    fn check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async {
            match self.client.get(self.endpoint.clone()).send().await {
                Ok(response) => response.status().is_success(),
                Err(_) => false,
            }
        })
    }
}

/// Terminal record of one supervised process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Process exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Terminating signal number, `None` on normal exit and on platforms
    /// without signals.
    pub signal: Option<i32>,
    /// Whether the exit followed an explicit [`BackendSupervisor::stop`].
    pub intentional: bool,
}

impl ExitReport {
    /// Returns `true` when the exit should be reported as a crash.
    ///
    /// A deliberate stop is never unexpected; outside of shutdown, any exit
    /// other than code 0 is.
    pub fn unexpected(&self) -> bool {
        !self.intentional && self.code != Some(0)
    }
}

/// Named observer callbacks forming the supervisor's public event contract.
///
/// Callbacks are invoked from the monitor task; no ordering is guaranteed
/// relative to other concurrent work.
pub trait SupervisorEvents: Send + Sync {
    /// Invoked exactly once after the supervised process has been reaped.
    fn on_exit(&self, report: ExitReport);

    /// Invoked when the process could not be spawned or reaped.
    fn on_spawn_error(&self, message: &str);
}

/// Lifecycle states of the supervised backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No launch attempted yet.
    Idle,
    /// Process spawned, readiness unknown.
    Starting,
    /// Readiness polling in progress.
    Polling,
    /// A probe observed a 2xx response.
    Ready,
    /// The readiness budget was exhausted without a 2xx response.
    TimedOut,
    /// Launch failed before or during spawn.
    Failed,
    /// Terminal state entered by [`BackendSupervisor::stop`].
    Stopped,
}

/// Owns the lifecycle of the bundled backend process.
///
/// At most one live child exists at a time; a second [`start`] while one is
/// live fails with [`BackendError::AlreadyRunning`].
///
/// [`start`]: BackendSupervisor::start
pub struct BackendSupervisor {
    plan: LaunchPlan,
    probe: Arc<dyn HealthProbe>,
    events: Arc<dyn SupervisorEvents>,
    state: SupervisorState,
    live: Arc<AtomicBool>,
    intentional_stop: Arc<AtomicBool>,
    stop_tx: Option<watch::Sender<bool>>,
    monitor: Option<JoinHandle<()>>,
}

impl BackendSupervisor {
    /// Creates an idle supervisor for one launch plan.
    pub fn new(
        plan: LaunchPlan,
        probe: Arc<dyn HealthProbe>,
        events: Arc<dyn SupervisorEvents>,
    ) -> Self {
        Self {
            plan,
            probe,
            events,
            state: SupervisorState::Idle,
            live: Arc::new(AtomicBool::new(false)),
            intentional_stop: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            monitor: None,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Returns `true` while a spawned child has not been reaped.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    /// Spawns the backend process and hands it to a monitor task.
    ///
    /// # Errors
    /// Returns [`BackendError::ExecutableNotFound`] when the planned
    /// executable does not exist, [`BackendError::AlreadyRunning`] when a
    /// child is still live, and [`BackendError::Spawn`] when the OS rejects
    /// the spawn. Spawn failures are also reported through
    /// [`SupervisorEvents::on_spawn_error`].
    pub fn start(&mut self) -> Result<(), BackendError> {
        if self.is_live() {
            return Err(BackendError::AlreadyRunning);
        }

        if !self.plan.executable.exists() {
            self.state = SupervisorState::Failed;
            return Err(BackendError::ExecutableNotFound(
                self.plan.executable.clone(),
            ));
        }

        let mut command = Command::new(&self.plan.executable);
        command.args(&self.plan.args);
        command.env_clear();
        command.envs(&self.plan.env);
        if self.plan.quiet_stdio {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        } else {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        command.kill_on_drop(true);
        #[cfg(windows)]
        {
            // CREATE_NO_WINDOW: the backend must never flash a console.
            command.creation_flags(0x0800_0000);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                self.state = SupervisorState::Failed;
                self.events.on_spawn_error(&error.to_string());
                return Err(BackendError::Spawn(error));
            }
        };

        let (stop_tx, mut stop_rx) = watch::channel(false);
        self.live.store(true, Ordering::Relaxed);

        let live = Arc::clone(&self.live);
        let intentional = Arc::clone(&self.intentional_stop);
        let events = Arc::clone(&self.events);
        let monitor = tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = stop_rx.changed() => {
                    let _ = child.start_kill();
                    child.wait().await
                }
            };

            live.store(false, Ordering::Relaxed);
            match status {
                Ok(status) => {
                    events.on_exit(build_exit_report(status, intentional.load(Ordering::Relaxed)));
                }
                Err(error) => events.on_spawn_error(&error.to_string()),
            }
        });

        self.stop_tx = Some(stop_tx);
        self.monitor = Some(monitor);
        self.state = SupervisorState::Starting;
        Ok(())
    }

    /// Polls the health probe within the configured budget.
    ///
    /// One probe per attempt; a failed attempt suspends for
    /// `config.interval_ms` before the next, including after the final one.
    /// Returns `true` on the first 2xx observation, `false` once the budget
    /// is exhausted. The already-running process is left untouched on
    /// timeout.
    pub async fn wait_until_ready(&mut self, config: &ReadinessConfig) -> bool {
        self.state = SupervisorState::Polling;

        for _attempt in 0..config.attempts {
            if self.probe.check().await {
                self.state = SupervisorState::Ready;
                return true;
            }

            tokio::time::sleep(Duration::from_millis(config.interval_ms)).await;
        }

        self.state = SupervisorState::TimedOut;
        false
    }

    /// Requests termination of the supervised process.
    ///
    /// No-op when nothing is live. Otherwise the intentional-shutdown flag is
    /// raised first so the exit observer never misreports a deliberate stop
    /// as a crash, then the monitor task is signalled to kill and reap the
    /// child. Invoked exactly once during application shutdown.
    pub fn stop(&mut self) {
        if !self.is_live() {
            return;
        }

        self.intentional_stop.store(true, Ordering::Relaxed);
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        self.state = SupervisorState::Stopped;
    }

    /// Waits for the monitor task to reap the child and deliver its report.
    pub async fn wait_for_exit(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            let _ = monitor.await;
        }
    }
}

fn build_exit_report(status: std::process::ExitStatus, intentional: bool) -> ExitReport {
    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(&status);
    #[cfg(not(unix))]
    let signal = None;

    ExitReport {
        code: status.code(),
        signal,
        intentional,
    }
}

/// Error type for backend launch and probe construction failures.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Planned executable is missing from disk.
    #[error("bundled backend executable not found at {}", .0.display())]
    ExecutableNotFound(PathBuf),
    /// A supervised child is still live.
    #[error("bundled backend is already running")]
    AlreadyRunning,
    /// OS-level spawn failure.
    #[error("failed to spawn bundled backend: {0}")]
    Spawn(#[from] std::io::Error),
    /// Probe endpoint is not a valid URL.
    #[error("invalid health endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP client construction failed.
    #[error("health client failure: {0}")]
    HealthClient(String),
}
