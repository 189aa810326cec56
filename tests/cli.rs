#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn cli(planning: &Path) -> Command {
    let mut cmd = Command::cargo_bin("creneaux-cli").unwrap();
    cmd.arg("--planning").arg(planning);
    cmd
}

fn october(planning: &Path) {
    cli(planning)
        .args(["init", "--month", "10", "--year", "2025"])
        .assert()
        .success();
    cli(planning)
        .args(["add-worker", "alice", "--priority", "1"])
        .assert()
        .success();
    cli(planning)
        .args(["create-slot", "--days", "1", "--meal", "lunch", "--times", "11:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 slot(s) created"));
}

#[test]
fn fill_and_export_a_month() {
    let dir = tempdir().unwrap();
    let planning = dir.path().join("planning.json");
    october(&planning);
    cli(&planning)
        .args(["add-rule", "alice", "--from", "10:00", "--weekdays", "0-6"])
        .assert()
        .success();

    cli(&planning)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: all 1 slot(s) filled"));

    cli(&planning)
        .args(["export", "--csv", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,Wed,lunch,11:00,alice"));

    cli(&planning)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no conflicts"));
}

#[test]
fn infeasible_run_exits_with_code_two() {
    let dir = tempdir().unwrap();
    let planning = dir.path().join("planning.json");
    october(&planning);
    cli(&planning)
        .args(["add-rule", "alice", "--from", "12:00"])
        .assert()
        .success();

    cli(&planning)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No complete schedule"));

    cli(&planning)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no one assigned"));
}

#[test]
fn query_fills_week_and_weekday_from_the_calendar() {
    let dir = tempdir().unwrap();
    let planning = dir.path().join("planning.json");
    october(&planning);
    cli(&planning)
        .args(["add-rule", "alice", "--from", "10:00", "--weeks", "2", "--meal", "lunch"])
        .assert()
        .success();

    cli(&planning)
        .args(["query", "alice", "--meal", "lunch", "--time", "11:00", "--day", "6"])
        .assert()
        .success()
        .stdout(predicate::str::diff("yes\n"));
    cli(&planning)
        .args(["query", "alice", "--meal", "lunch", "--time", "11:00", "--day", "1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("no\n"));
    cli(&planning)
        .args(["query", "alice", "--meal", "lunch", "--time", "11:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed query"));
}

#[test]
fn duplicate_cap_needs_replace() {
    let dir = tempdir().unwrap();
    let planning = dir.path().join("planning.json");
    october(&planning);
    cli(&planning)
        .args(["add-rule", "alice", "--monthly-cap", "3"])
        .assert()
        .success();
    cli(&planning)
        .args(["add-rule", "alice", "--monthly-cap", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already has a monthly cap"));
    cli(&planning)
        .args(["add-rule", "alice", "--monthly-cap", "4", "--replace"])
        .assert()
        .success();
    cli(&planning)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] at most 4 shift(s) per month"));
}

#[test]
fn import_workers_and_refuse_second_init() {
    let dir = tempdir().unwrap();
    let planning = dir.path().join("planning.json");
    let csv = dir.path().join("workers.csv");
    fs::write(&csv, "name,priority\nbob,2\ncarol,3\n").unwrap();

    october(&planning);
    cli(&planning)
        .arg("import-workers")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 worker(s) imported"));

    cli(&planning)
        .args(["init", "--month", "11", "--year", "2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let stored = fs::read_to_string(&planning).unwrap();
    assert!(stored.contains("\"carol\""));
}

#[test]
fn commands_need_an_initialized_planning() {
    let dir = tempdir().unwrap();
    cli(&dir.path().join("missing.json"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `init` first"));
}
