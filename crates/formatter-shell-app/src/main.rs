#![warn(missing_docs)]
//! # formatter-shell-app binary
//!
//! Headless shell session: resolves configuration, runs the startup
//! sequence (runtime log, bundled backend launch and readiness poll),
//! then idles until interrupted and stops the backend on the way out.

use std::sync::Arc;

use formatter_shell_app::{ConsoleSurface, DesktopShell, ShellConfig, ShellError, app_version};

/// Process entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("failed to start formatter shell: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ShellError> {
    let config = ShellConfig::from_env()?;
    let mut shell = DesktopShell::new(config, Arc::new(ConsoleSurface))?;

    let report = shell.run_startup().await?;
    println!("formatter-shell-app {}", app_version());
    println!("renderer_url={}", report.renderer_url);
    println!("backend_launched={}", report.backend_launched);
    if let Some(ready) = report.backend_ready {
        println!("backend_ready={ready}");
    }
    if let Some(path) = shell.log_file_path() {
        println!("runtime_log={}", path.display());
    }

    let _ = tokio::signal::ctrl_c().await;
    shell.shutdown().await;
    Ok(())
}
