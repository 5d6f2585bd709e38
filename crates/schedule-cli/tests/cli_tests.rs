//! Integration tests for the `schedule` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to run each subcommand through
//! the actual binary, including stdin piping, file output, config loading and
//! error exits.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture must exist")
}

fn schedule() -> Command {
    let mut cmd = Command::cargo_bin("schedule").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout should be JSON")
}

// ─────────────────────────────────────────────────────────────────────────────
// conflicts
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn conflicts_text_summary_uses_pm_names() {
    schedule()
        .args(["conflicts", "-i", &fixture("calls.json")])
        .args(["--managers", &fixture("managers.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Found 1 scheduling conflict: Alice Johnson: 2 overlapping calls starting at 09:00",
        ));
}

#[test]
fn conflicts_from_stdin_without_names_prints_ids() {
    schedule()
        .arg("conflicts")
        .write_stdin(read_fixture("calls.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("pm-1: 2 overlapping calls"));
}

#[test]
fn conflicts_json_lists_groups() {
    let json = stdout_json(
        schedule().args(["conflicts", "-i", &fixture("calls.json"), "--format", "json"]),
    );

    let groups = json.as_array().expect("array of groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["key"]["assigneeId"], "pm-1");
    let ids: Vec<&str> = groups[0]["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn conflicts_none_found() {
    schedule()
        .arg("conflicts")
        .write_stdin("[]")
        .assert()
        .success()
        .stdout(predicate::str::contains("No scheduling conflicts found."));
}

#[test]
fn conflicts_bad_timestamp_fails_with_event_id() {
    schedule()
        .args(["conflicts", "-i", &fixture("bad_calls.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timestamp on event 7"));
}

#[test]
fn conflicts_invalid_json_fails() {
    schedule()
        .arg("conflicts")
        .write_stdin("this is not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse JSON"));
}

#[test]
fn conflicts_to_output_file() {
    let dir = std::env::temp_dir().join(format!("schedule-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("conflicts.txt");

    schedule()
        .args(["conflicts", "-i", &fixture("calls.json")])
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).expect("output file must exist");
    assert!(content.starts_with("Found 1 scheduling conflict"));

    let _ = std::fs::remove_dir_all(&dir);
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_lists_overlapping_calls() {
    schedule()
        .args(["check", "--candidate", &fixture("candidate.json")])
        .args(["-i", &fixture("calls.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Call 99 overlaps 2 existing call(s)"))
        .stdout(predicate::str::contains("1 \"Sprint review\" (10 min)"))
        .stdout(predicate::str::contains("2 \"Budget check-in\" (25 min)"));
}

#[test]
fn check_json_reports_overlap_minutes() {
    let json = stdout_json(
        schedule()
            .args(["check", "--candidate", &fixture("candidate.json")])
            .args(["--format", "json"])
            .write_stdin(read_fixture("calls.json")),
    );

    let overlaps = json.as_array().unwrap();
    assert_eq!(overlaps.len(), 2);
    assert_eq!(overlaps[0]["overlapMinutes"], 10);
    assert_eq!(overlaps[1]["overlapMinutes"], 25);
}

// ─────────────────────────────────────────────────────────────────────────────
// expand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn expand_weekdays_skips_weekend() {
    let json = stdout_json(
        schedule()
            .args(["expand", "-i", &fixture("template.json")])
            .args(["--start", "2024-03-01T10:00:00Z"])
            .args(["--duration", "60", "--pattern", "weekdays"])
            .args(["--horizon-days", "7"]),
    );

    let events = json.as_array().unwrap();
    let starts: Vec<&str> = events
        .iter()
        .map(|e| e["startTime"].as_str().unwrap())
        .collect();
    assert_eq!(
        starts,
        vec![
            "2024-03-01T10:00:00Z",
            "2024-03-04T10:00:00Z",
            "2024-03-05T10:00:00Z",
            "2024-03-06T10:00:00Z",
            "2024-03-07T10:00:00Z",
        ]
    );
    // The template owns id 1, so the counter hands out 2 onwards.
    assert_eq!(events[0]["id"], "2");
    assert_eq!(events[4]["id"], "6");
    assert_eq!(events[0]["endTime"], "2024-03-01T11:00:00Z");
    assert_eq!(events[0]["title"], "Daily client sync");
}

#[test]
fn expand_default_horizon_is_three_months() {
    let json = stdout_json(
        schedule()
            .args(["expand", "--start", "2024-03-04T09:00:00Z"])
            .args(["--duration", "30", "--pattern", "weekdays"])
            .write_stdin(read_fixture("template.json")),
    );

    assert_eq!(json.as_array().unwrap().len(), 66);
}

#[test]
fn expand_with_uuid_ids() {
    let json = stdout_json(
        schedule()
            .args(["expand", "-i", &fixture("template.json")])
            .args(["--start", "2024-03-04T09:00:00Z", "--duration", "30"])
            .args(["--pattern", "weekdays", "--horizon-days", "3", "--ids", "uuid"]),
    );

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.len() == 36));
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn expand_weekly_warns_and_returns_one_instance() {
    let assert = schedule()
        .args(["expand", "-i", &fixture("template.json")])
        .args(["--start", "2024-03-04T09:00:00Z", "--duration", "30"])
        .args(["--pattern", "weekly"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no expansion rule"));

    let json: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[test]
fn expand_unknown_pattern_fails() {
    schedule()
        .args(["expand", "-i", &fixture("template.json")])
        .args(["--start", "2024-03-04T09:00:00Z", "--duration", "30"])
        .args(["--pattern", "fortnightly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid recurrence rule: fortnightly"));
}

#[test]
fn expand_non_positive_duration_fails() {
    schedule()
        .args(["expand", "-i", &fixture("template.json")])
        .args(["--start", "2024-03-04T09:00:00Z", "--duration", "-15"])
        .args(["--pattern", "weekdays"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration: -15 minutes"));
}

#[test]
fn expand_huge_horizon_fails_cleanly() {
    for (days, message) in [
        ("9223372036854775807", "--horizon-days 9223372036854775807 is out of range"),
        ("100000", "horizon too long: 100000 days"),
    ] {
        schedule()
            .args(["expand", "-i", &fixture("template.json")])
            .args(["--start", "2024-03-04T09:00:00Z", "--duration", "30"])
            .args(["--pattern", "weekdays", "--horizon-days", days])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains(message))
            .stderr(predicate::str::contains("panicked").not());
    }
}

#[test]
fn expand_huge_duration_fails_cleanly() {
    schedule()
        .args(["expand", "-i", &fixture("template.json")])
        .args(["--start", "2024-03-04T09:00:00Z", "--duration", "1000000000000"])
        .args(["--pattern", "weekdays", "--horizon-days", "7"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid duration: 1000000000000 minutes"));
}

#[test]
fn expand_bad_start_fails() {
    schedule()
        .args(["expand", "-i", &fixture("template.json")])
        .args(["--start", "monday", "--duration", "30", "--pattern", "weekdays"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --start timestamp"));
}

#[test]
fn expand_unknown_timezone_fails() {
    schedule()
        .args(["expand", "-i", &fixture("template.json")])
        .args(["--start", "2024-03-04T09:00:00Z", "--duration", "30"])
        .args(["--pattern", "weekdays", "--timezone", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone: Mars/Olympus"));
}

// ─────────────────────────────────────────────────────────────────────────────
// metrics / availability
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn metrics_report() {
    let json = stdout_json(
        schedule()
            .args(["metrics", "-i", &fixture("calls.json")])
            .args(["--managers", &fixture("managers.json")]),
    );

    assert_eq!(json["metrics"]["totalPms"], 2);
    assert_eq!(json["metrics"]["totalCalls"], 4);
    assert_eq!(json["metrics"]["completedCalls"], 1);
    assert_eq!(json["metrics"]["conflictCount"], 1);
    assert_eq!(json["availability"][0]["name"], "Alice Johnson");
    assert_eq!(json["availability"][0]["busyHours"], 1.0);
    assert_eq!(json["workload"][1]["calls"], 2);
    assert_eq!(json["hourlyDistribution"].as_array().unwrap().len(), 10);
}

#[test]
fn availability_uses_config_file() {
    let json = stdout_json(
        schedule()
            .args(["--config", &fixture("schedule.toml")])
            .args(["availability", "-i", &fixture("calls.json")])
            .args(["--assignee", "pm-1", "--date", "2024-03-04"]),
    );

    assert_eq!(json["bookedHours"], 0.75);
    assert_eq!(json["availableHours"], 2.25);
    assert_eq!(json["availabilityPercentage"], 75.0);
    let slots = json["timeSlots"].as_array().unwrap();
    assert_eq!(slots.len(), 6);
    assert_eq!(slots[0]["time"], "09:00:00");
    assert_eq!(slots[0]["isAvailable"], false);
    assert_eq!(slots[1]["isAvailable"], false);
    assert_eq!(slots[2]["isAvailable"], true);
}

#[test]
fn availability_bad_date_fails() {
    schedule()
        .args(["availability", "-i", &fixture("calls.json")])
        .args(["--assignee", "pm-1", "--date", "04/03/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --date"));
}

#[test]
fn missing_config_file_fails() {
    schedule()
        .args(["--config", "/nonexistent/schedule.toml"])
        .args(["conflicts", "-i", &fixture("calls.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
