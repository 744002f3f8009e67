//! Integration tests for the `series-cal` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the project, rule and id
//! subcommands through the actual binary, including stdin piping, file output, config
//! files with flag overrides, and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn workspace_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/workspace.json")
}

fn retain_config_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/retain.json")
}

const WEEK: [&str; 4] = [
    "--start",
    "2025-03-03T00:00:00Z",
    "--end",
    "2025-03-10T00:00:00Z",
];

/// Runs `project` over the fixture week and returns the parsed entries.
fn project(extra: &[&str]) -> Vec<Value> {
    let output = Command::cargo_bin("series-cal")
        .unwrap()
        .args(["project", "-i", workspace_json_path()])
        .args(WEEK)
        .args(extra)
        .output()
        .expect("binary runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let value: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    value.as_array().expect("array output").clone()
}

fn ids(entries: &[Value]) -> Vec<&str> {
    entries.iter().map(|e| e["id"].as_str().unwrap()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Project subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn project_file_to_stdout() {
    let entries = project(&[]);

    assert_eq!(
        ids(&entries),
        vec![
            "news:20250303T090000Z",
            "quiz:20250304T200000Z",
            "quiz:20250305T200000Z",
            "gala",
            "news:20250307T090000Z",
        ]
    );
}

#[test]
fn project_emits_calendar_entry_shape() {
    let entries = project(&[]);
    let special = entries
        .iter()
        .find(|e| e["id"] == "news:20250307T090000Z")
        .unwrap();

    assert_eq!(special["title"], "Morning News: Budget Special");
    assert_eq!(special["startTime"], "2025-03-07T09:00:00Z");
    assert_eq!(special["endTime"], "2025-03-07T11:00:00Z");
    assert_eq!(special["parentId"], "news");
    assert_eq!(special["color"], "blue");
    assert_eq!(special["isRecurrence"], true);
    assert_eq!(special["isException"], true);
    assert_eq!(special["recurringPattern"], "FREQ=WEEKLY;BYDAY=MO,WE,FR");

    let gala = entries.iter().find(|e| e["id"] == "gala").unwrap();
    assert_eq!(gala["isRecurrence"], false);
    assert_eq!(gala["isCancelled"], true);
    assert_eq!(gala["recurringPattern"], Value::Null);
}

#[test]
fn project_stdin_with_date_only_window() {
    let input = std::fs::read_to_string(workspace_json_path()).unwrap();

    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["project", "--start", "2025-03-04", "--end", "2025-03-05"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("quiz:20250304T200000Z"))
        .stdout(predicate::str::contains("news:").not());
}

#[test]
fn project_to_output_file() {
    let output_path = std::env::temp_dir().join("series-cal-test-project.json");
    let _ = std::fs::remove_file(&output_path);

    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["project", "-i", workspace_json_path(), "--pretty", "-o"])
        .arg(&output_path)
        .args(WEEK)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(&output_path).expect("output file must exist");
    assert!(content.contains('\n'), "pretty output spans lines");
    let entries: Vec<Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(entries.len(), 5);

    let _ = std::fs::remove_file(&output_path);
}

#[test]
fn retain_cancelled_flag_keeps_cancelled_instance() {
    let entries = project(&["--retain-cancelled"]);

    assert_eq!(entries.len(), 6);
    let cancelled = entries
        .iter()
        .find(|e| e["id"] == "news:20250305T090000Z")
        .unwrap();
    assert_eq!(cancelled["isCancelled"], true);
    assert_eq!(cancelled["isException"], true);
}

#[test]
fn config_file_is_applied() {
    let entries = project(&["--config", retain_config_path()]);
    assert!(ids(&entries).contains(&"news:20250305T090000Z"));
}

#[test]
fn flag_overrides_config_file() {
    let entries = project(&["--config", retain_config_path(), "--hide-cancelled-series"]);

    // config retains the cancelled instance, flag hides the cancelled gala
    assert_eq!(entries.len(), 5);
    assert!(!ids(&entries).contains(&"gala"));
    assert!(ids(&entries).contains(&"news:20250305T090000Z"));
}

#[test]
fn project_invalid_rule_names_series_and_fragment() {
    let input = r#"{"templates": [{
        "id": "broken",
        "title": "Broken",
        "firstOccurrenceStart": "2025-03-03T09:00:00Z",
        "firstOccurrenceEnd": "2025-03-03T10:00:00Z",
        "recurrenceRule": "FREQ=WEEKLY;BYDAY=XX"
    }]}"#;

    Command::cargo_bin("series-cal")
        .unwrap()
        .arg("project")
        .args(WEEK)
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"))
        .stderr(predicate::str::contains("BYDAY=XX"));
}

#[test]
fn project_invalid_json_fails() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .arg("project")
        .args(WEEK)
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse workspace JSON"));
}

#[test]
fn project_invalid_window_bound_fails() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["project", "-i", workspace_json_path()])
        .args(["--start", "next tuesday", "--end", "2025-03-10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --start"));
}

#[test]
fn inverted_window_is_empty() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["project", "-i", workspace_json_path()])
        .args(["--start", "2025-03-10", "--end", "2025-03-03"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn rule_prints_canonical_form() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["rule", "freq=weekly;byday=fr,mo;count=10"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "canonical: FREQ=WEEKLY;BYDAY=MO,FR;COUNT=10",
        ))
        .stdout(predicate::str::contains("weekdays:  1,5"))
        .stdout(predicate::str::contains("after 10 occurrences"));
}

#[test]
fn empty_rule_is_non_recurring() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["rule", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("non-recurring"));
}

#[test]
fn malformed_rule_reports_fragment() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["rule", "FREQ=DAILY;COUNT=0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("COUNT=0"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Id subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn id_encode() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["id", "encode", "abc", "2025-03-10T09:00:00Z"])
        .assert()
        .success()
        .stdout("abc:20250310T090000Z\n");
}

#[test]
fn id_decode() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["id", "decode", "abc:20250310T090000Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("series_id:     abc"))
        .stdout(predicate::str::contains("2025-03-10T09:00:00+00:00"));
}

#[test]
fn id_decode_rejects_garbage() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .args(["id", "decode", "abc-20250310"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid occurrence id"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Misc
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("rule"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("series-cal")
        .unwrap()
        .arg("expand")
        .assert()
        .failure();
}
