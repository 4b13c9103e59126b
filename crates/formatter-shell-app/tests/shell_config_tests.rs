//! Integration tests for environment-driven shell configuration.

use std::path::PathBuf;

use formatter_shell_app::{ShellConfig, packaged_from_env};

#[test]
fn shell_config_tests_resolves_env_overrides_in_one_pass() {
    // Safety:
    // - Integration tests mutate process env in a single-threaded test body.
    // - Every variable is removed before returning.
    unsafe { std::env::set_var("FORMATTER_SHELL_PACKAGED", "0") };
    assert!(!packaged_from_env());

    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_PACKAGED", "false") };
    assert!(!packaged_from_env());

    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_PACKAGED", "OFF") };
    assert!(!packaged_from_env());

    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_PACKAGED", "1") };
    assert!(packaged_from_env());

    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_RENDERER_URL", "http://localhost:4100") };
    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_RESOURCES_DIR", "/srv/shell/resources") };
    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_DEV_DIR", "/srv/shell/dev") };
    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_APP_ROOT", "/srv/shell/app") };
    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_USER_DATA_DIR", "/srv/shell/data") };
    // Safety: see rationale above.
    unsafe { std::env::set_var("FORMATTER_SHELL_DOWNLOADS_DIR", "/srv/shell/downloads") };

    let config = ShellConfig::from_env().expect("config should resolve");
    assert!(config.packaged);
    assert_eq!(config.dev_server_url, "http://localhost:4100");
    assert_eq!(config.resources_dir, PathBuf::from("/srv/shell/resources"));
    assert_eq!(config.dev_dir, PathBuf::from("/srv/shell/dev"));
    assert_eq!(config.app_root, PathBuf::from("/srv/shell/app"));
    assert_eq!(config.user_data_dir, PathBuf::from("/srv/shell/data"));
    assert_eq!(config.downloads_dir, PathBuf::from("/srv/shell/downloads"));
    let budget = config
        .readiness
        .total_budget_ms()
        .expect("default budget should fit");
    assert!(budget >= 45_000);

    for key in [
        "FORMATTER_SHELL_PACKAGED",
        "FORMATTER_SHELL_RENDERER_URL",
        "FORMATTER_SHELL_RESOURCES_DIR",
        "FORMATTER_SHELL_DEV_DIR",
        "FORMATTER_SHELL_APP_ROOT",
        "FORMATTER_SHELL_USER_DATA_DIR",
        "FORMATTER_SHELL_DOWNLOADS_DIR",
    ] {
        // Safety: see rationale above.
        unsafe { std::env::remove_var(key) };
    }

    let defaults = ShellConfig::from_env().expect("config should resolve");
    assert_eq!(defaults.dev_server_url, "http://localhost:3000");
    assert!(defaults.resources_dir.ends_with("resources"));
    assert!(defaults.user_data_dir.ends_with("user-data"));
}
