//! Validates contract fixtures and live wire values against frozen JSON schemas.

use formatter_shell_bridge::ExportLogsOutcome;
use formatter_shell_core::{LogEntry, LogLevel};
use jsonschema::JSONSchema;
use serde_json::Value;

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

fn log_line_validator() -> JSONSchema {
    compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/runtime-log-line.schema.json"
    ))
}

fn export_outcome_validator() -> JSONSchema {
    compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/export-logs-outcome.schema.json"
    ))
}

#[test]
fn log_line_fixture_matches_schema() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/runtime-log-line.valid.json"
    ));
    assert!(
        log_line_validator().is_valid(&fixture),
        "log line fixture should validate against schema"
    );
}

#[test]
fn log_line_invalid_fixture_is_rejected() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/runtime-log-line.invalid.json"
    ));
    assert!(
        !log_line_validator().is_valid(&fixture),
        "malformed log line fixture should be rejected"
    );
}

#[test]
fn live_log_entry_matches_schema() {
    let entry = LogEntry::new(
        LogLevel::Warn,
        "Blocked navigation outside allowlist",
        "2026-02-09T12:00:00.000Z",
    )
    .with_context("targetUrl", "https://example.com/docs");
    let line = entry.to_json_line().expect("entry should encode");
    let value: Value = serde_json::from_str(line.trim_end()).expect("line should parse");

    assert!(
        log_line_validator().is_valid(&value),
        "live log entry should validate against schema"
    );
}

#[test]
fn export_outcome_fixtures_match_schema() {
    let validator = export_outcome_validator();
    for fixture_path in [
        concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../contracts/fixtures/export-logs-outcome.exported.json"
        ),
        concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../contracts/fixtures/export-logs-outcome.cancelled.json"
        ),
        concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../contracts/fixtures/export-logs-outcome.failed.json"
        ),
    ] {
        let fixture = load_json(fixture_path);
        assert!(
            validator.is_valid(&fixture),
            "{fixture_path} should validate against schema"
        );
    }
}

#[test]
fn export_outcome_invalid_fixture_is_rejected() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/export-logs-outcome.invalid.json"
    ));
    assert!(
        !export_outcome_validator().is_valid(&fixture),
        "outcome with unknown keys and no file path should be rejected"
    );
}

#[test]
fn live_export_outcomes_match_schema() {
    let validator = export_outcome_validator();
    let outcomes = [
        ExportLogsOutcome::exported("/tmp/out.log"),
        ExportLogsOutcome::cancelled(),
        ExportLogsOutcome::failed("copy failed"),
    ];

    for outcome in outcomes {
        let value = serde_json::to_value(&outcome).expect("outcome should encode");
        assert!(
            validator.is_valid(&value),
            "live outcome should validate against schema"
        );
    }
}
