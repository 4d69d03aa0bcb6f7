#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TODAY: &str = "2025-12-17";

const FEED: &str = "\
Client,Placement Status,Placement Expiry Date,Placement Specialist,Total Premium,Coverage,Product Line,Carrier Group,Placement Id
Acme Corp,Quote,15-02-2026,Mary Jackson,125000,Property,Commercial,Tata AIG,PL-1
Globex,Quote,20/02/26,Mary Jackson,50000,Liability,Commercial,HDFC Ergo,PL-2
Initech,Submitted,22-12-2025,Raj Patel,9000,Marine,SME,ICICI Lombard,PL-3
Hooli,Bound,01-03-2026,,200000,Property,Corporate,Bajaj Allianz,PL-4
Umbrella,Declination,-,Raj Patel,1000,Cyber,SME,Go Digit,PL-5
";

fn renewals(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("renewals").unwrap();
    cmd.current_dir(dir.path())
        .env("RENEWALS_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    renewals(dir).arg("init").assert().success();
    std::fs::write(dir.path().join("data/renewals.csv"), FEED).unwrap();
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::create_dir_all(dir.path().join(".renewals")).unwrap();
    std::fs::write(dir.path().join(".renewals/config.yaml"), yaml).unwrap();
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// renewals init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_data_dir() {
    let dir = TempDir::new().unwrap();
    renewals(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .renewals/config.yaml"));

    assert!(dir.path().join(".renewals/config.yaml").exists());
    assert!(dir.path().join("data").is_dir());
}

#[test]
fn init_is_idempotent_and_keeps_edits() {
    let dir = TempDir::new().unwrap();
    renewals(&dir).arg("init").assert().success();
    write_config(&dir, "policy:\n  urgency_window_days: 21\n");

    renewals(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .renewals/config.yaml"));
    let content = std::fs::read_to_string(dir.path().join(".renewals/config.yaml")).unwrap();
    assert!(content.contains("urgency_window_days: 21"));
}

// ---------------------------------------------------------------------------
// renewals status
// ---------------------------------------------------------------------------

#[test]
fn status_reports_missing_feed() {
    let dir = TempDir::new().unwrap();
    renewals(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn status_json_describes_feed() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let status = json_output(renewals(&dir).args(["status", "--json"]));
    assert_eq!(status["exists"], true);
    assert_eq!(status["delimiter"], "comma");
    assert_eq!(status["columns"], 9);
    assert_eq!(status["records"], 5);
    assert_eq!(status["missing_columns"].as_array().unwrap().len(), 0);
}

#[test]
fn status_lists_dropped_rows() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let feed = format!("{FEED},Quote,15-02-2026,Mary,1,,,,\n");
    std::fs::write(dir.path().join("data/renewals.csv"), feed).unwrap();
    renewals(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("line 7: missing client"));
}

// ---------------------------------------------------------------------------
// renewals actions
// ---------------------------------------------------------------------------

#[test]
fn actions_lists_policy_decisions() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    renewals(&dir)
        .args(["actions", "--today", TODAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("URGENT EXPIRY: Initech (5 days left)"))
        .stdout(predicate::str::contains("Follow-up Call: Acme Corp"))
        .stdout(predicate::str::contains("Send Policy Documents: Hooli"))
        .stdout(predicate::str::contains("(no action)"));
}

#[test]
fn actions_json_has_target_dates() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let planned = json_output(renewals(&dir).args(["actions", "--json", "--today", TODAY]));
    let planned = planned.as_array().unwrap();
    assert_eq!(planned.len(), 5);
    assert_eq!(planned[0]["target_date"], "2025-12-24");
    assert_eq!(planned[2]["action"]["urgent"], true);
    assert_eq!(planned[3]["specialist"], "Unassigned");
    assert!(planned[4]["action"].is_null());
}

#[test]
fn actions_without_feed_fails() {
    let dir = TempDir::new().unwrap();
    renewals(&dir)
        .args(["actions", "--today", TODAY])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feed not found"));
}

// ---------------------------------------------------------------------------
// renewals preview / sync
// ---------------------------------------------------------------------------

#[test]
fn preview_schedules_without_creating_events() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let report = json_output(renewals(&dir).args(["preview", "--json", "--today", TODAY]));

    assert_eq!(report["dry_run"], true);
    assert_eq!(report["total"], 5);
    assert_eq!(report["processed"], 4);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["events_created"], 0);
    assert_eq!(report["errors"], 0);
    assert_eq!(report["specialists"], 3);

    let outcomes = report["outcomes"].as_array().unwrap();
    let globex = outcomes.iter().find(|o| o["client"] == "Globex").unwrap();
    assert_eq!(globex["outcome"], "scheduled");
    assert_eq!(globex["start"], "10:30");
    let umbrella = outcomes.iter().find(|o| o["client"] == "Umbrella").unwrap();
    assert_eq!(umbrella["reason"], "no_expiry");
}

#[test]
fn preview_text_summary() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    renewals(&dir)
        .args(["preview", "--today", TODAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Schedule by day:"))
        .stdout(predicate::str::contains("2025-12-24: 2 event(s)"))
        .stdout(predicate::str::contains("Scheduled:       4"));
}

#[test]
fn preview_respects_max() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let report = json_output(renewals(&dir).args([
        "preview", "--json", "--today", TODAY, "--max", "2",
    ]));
    assert_eq!(report["total"], 2);
    assert_eq!(report["processed"], 2);
}

#[test]
fn sync_to_file_backend_writes_events() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_config(
        &dir,
        "calendar:\n  rate_limit_ms: 0\n  backend:\n    type: file\n    path: out/events.jsonl\n",
    );

    let report = json_output(renewals(&dir).args(["sync", "--json", "--today", TODAY]));
    assert_eq!(report["dry_run"], false);
    assert_eq!(report["sink"], "file");
    assert_eq!(report["events_created"], 4);

    let events = std::fs::read_to_string(dir.path().join("out/events.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = events
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["title"], "Follow-up Call: Acme Corp");
    assert_eq!(lines[0]["start"], "2025-12-24T10:00:00+05:30");
    assert_eq!(lines[0]["timezone"], "Asia/Kolkata");
}

#[test]
fn sync_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_config(&dir, "schedule:\n  slot_step_minutes: 0\n");
    renewals(&dir)
        .args(["sync", "--today", TODAY])
        .assert()
        .failure()
        .stderr(predicate::str::contains("slot_step_minutes"));
}

// ---------------------------------------------------------------------------
// renewals config
// ---------------------------------------------------------------------------

#[test]
fn config_show_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let config = json_output(renewals(&dir).args(["config", "show", "--json"]));
    assert_eq!(config["schedule"]["business_hours"]["start"], "09:00");
    assert_eq!(config["schedule"]["slot_step_minutes"], 15);
    assert_eq!(config["calendar"]["backend"]["type"], "dry_run");
}

#[test]
fn config_validate_clean() {
    let dir = TempDir::new().unwrap();
    renewals(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "schedule:\n  business_hours:\n    start: \"17:00\"\n    end: \"09:00\"\n",
    );
    renewals(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] business_hours"))
        .stderr(predicate::str::contains("config validation found errors"));
}
