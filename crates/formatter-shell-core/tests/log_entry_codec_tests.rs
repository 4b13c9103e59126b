//! Tests NDJSON encoding and decoding of runtime log entries.

use formatter_shell_core::{LogEntry, LogLevel};
use serde_json::Value;

#[test]
fn log_entry_codec_tests_serialize_single_terminated_line() {
    let entry = LogEntry::new(LogLevel::Error, "m", "2026-02-09T12:00:00.000Z")
        .with_context("code", 1);

    let line = entry.to_json_line().expect("entry should encode");
    assert!(line.ends_with('\n'));

    let body = line.trim_end_matches('\n');
    assert!(!body.contains('\n'));

    let parsed: Value = serde_json::from_str(body).expect("line should be one JSON object");
    assert_eq!(parsed["level"], "error");
    assert_eq!(parsed["message"], "m");
    assert_eq!(parsed["timestamp"], "2026-02-09T12:00:00.000Z");
    assert_eq!(parsed["context"]["code"], 1);
}

#[test]
fn log_entry_codec_tests_escape_embedded_newlines() {
    let entry = LogEntry::new(LogLevel::Warn, "line one\nline two", "2026-02-09T12:00:00.000Z");

    let line = entry.to_json_line().expect("entry should encode");
    assert_eq!(line.matches('\n').count(), 1);
    assert!(line.ends_with('\n'));
}

#[test]
fn log_entry_codec_tests_round_trip_json() {
    let entry = LogEntry::new(LogLevel::Info, "ready", "2026-02-09T12:00:00.000Z")
        .with_context("attempt", 3)
        .with_context("endpoint", "http://127.0.0.1:8000/healthz");

    let line = entry.to_json_line().expect("entry should encode");
    let decoded = LogEntry::from_json_line(&line).expect("line should decode");
    assert_eq!(decoded, entry);
}

#[test]
fn log_entry_codec_tests_reject_unknown_fields() {
    let line = r#"{"level":"info","message":"m","timestamp":"t","context":{},"extra":true}"#;
    assert!(LogEntry::from_json_line(line).is_err());
}
