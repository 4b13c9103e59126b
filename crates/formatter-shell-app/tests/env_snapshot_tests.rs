//! Tests process environment snapshotting for the backend launch plan.

#![cfg(unix)]

mod common;

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::sync::Arc;

use common::{NeverReadyProbe, RecordingSurface, SaveChoice, fixture_config, test_temp_dir};
use formatter_shell_app::{DesktopShell, process_env_snapshot};
use formatter_shell_backend::SupervisorState;

#[test]
fn env_snapshot_tests_tolerates_non_unicode_variables() {
    let opaque = OsString::from_vec(vec![0x66, 0x6f, 0x6f, 0xff, 0xfe]);
    // Safety:
    // - This test binary runs its single test on one thread.
    // - The variable is removed before returning.
    unsafe { std::env::set_var("OPAQUE_BYTES", &opaque) };

    let snapshot = process_env_snapshot();
    let value = snapshot
        .get("OPAQUE_BYTES")
        .expect("opaque variable should survive the snapshot");
    assert_eq!(value, "foo\u{FFFD}\u{FFFD}");

    let root = test_temp_dir("env-snapshot");
    let surface = Arc::new(RecordingSurface::new(SaveChoice::AcceptDefault));
    let shell = DesktopShell::with_probe(
        fixture_config(&root, false),
        surface,
        Arc::new(NeverReadyProbe),
    );
    assert_eq!(shell.backend_state(), SupervisorState::Idle);

    // Safety: see rationale above.
    unsafe { std::env::remove_var("OPAQUE_BYTES") };
}
