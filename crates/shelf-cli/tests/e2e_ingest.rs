//! E2E CLI workflow tests: init -> ingest -> snapshot/ranking/achievements/xp.
//!
//! Each test runs the `shelf` binary as a subprocess against an isolated
//! temp data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the shelf binary, rooted in `dir`.
fn shelf_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("shelf"));
    cmd.current_dir(dir);
    cmd.env("SHELF_DATA_DIR", dir.join(".shelf"));
    // Suppress tracing output that goes to stderr
    cmd.env("SHELF_LOG", "error");
    cmd
}

fn init_data_dir(dir: &Path) {
    shelf_cmd(dir).args(["init"]).assert().success();
}

/// Write a JSON batch file of label rows and return its path.
fn write_batch(dir: &Path, name: &str, rows: &[(&str, &str)]) -> std::path::PathBuf {
    let rows: Vec<Value> = rows
        .iter()
        .map(|(user, status)| {
            serde_json::json!({
                "entity_user_id": user,
                "product_class": "dairy",
                "location": "aisle-1",
                "status": status,
                "stock_qty": 1,
            })
        })
        .collect();
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(&rows).expect("serialize batch"))
        .expect("write batch file");
    path
}

/// Ingest a batch for a store-day and return the parsed JSON report.
fn ingest_json(dir: &Path, store: &str, kind: &str, file: &Path) -> Value {
    let output = shelf_cmd(dir)
        .args([
            "ingest",
            "--store",
            store,
            "--date",
            "2026-03-14",
            "--kind",
            kind,
            "--file",
            file.to_str().expect("utf8 path"),
            "--json",
        ])
        .output()
        .expect("ingest should not crash");
    assert!(
        output.status.success(),
        "ingest failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("ingest --json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_store_and_config() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());

    assert!(dir.path().join(".shelf/shelf.sqlite3").exists());
    assert!(dir.path().join(".shelf/shelf.toml").exists());
    assert!(dir.path().join(".shelf/locks").is_dir());
}

#[test]
fn init_twice_requires_force() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());

    shelf_cmd(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    shelf_cmd(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn commands_fail_cleanly_without_init() {
    let dir = TempDir::new().expect("temp dir");
    shelf_cmd(dir.path())
        .args(["snapshot", "st-042", "--date", "2026-03-14"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn ingest_reports_score_and_rank() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());
    let batch = write_batch(
        dir.path(),
        "batch.json",
        &[
            ("u-1", "updated"),
            ("u-1", "updated"),
            ("u-1", "outdated"),
            ("u-2", "unread_with_stock"),
        ],
    );

    let report = ingest_json(dir.path(), "st-042", "label", &batch);
    assert_eq!(report["success"], true);
    assert_eq!(report["scope"], "st-042_2026-03-14_label");
    assert_eq!(report["rank_position"], 1);
    assert!(report["composite_score"].as_i64().expect("score") > 0);
}

#[test]
fn snapshot_shows_ingested_metrics() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());
    let batch = write_batch(dir.path(), "batch.json", &[("u-1", "updated")]);
    ingest_json(dir.path(), "st-042", "label", &batch);

    let output = shelf_cmd(dir.path())
        .args(["snapshot", "st-042", "--date", "2026-03-14", "--json"])
        .output()
        .expect("snapshot should not crash");
    assert!(output.status.success());

    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(snapshot["entity_id"], "st-042");
    assert_eq!(snapshot["total_items"], 1);
    assert_eq!(snapshot["items_updated"], 1);
    assert!(snapshot["kinds"]["label"].is_object());
}

#[test]
fn snapshot_for_unknown_day_is_a_clean_failure() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());

    shelf_cmd(dir.path())
        .args(["snapshot", "st-042", "--date", "2020-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001"));
}

#[test]
fn ranking_orders_stores_by_score() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());

    let strong = write_batch(
        dir.path(),
        "strong.json",
        &[("u-1", "updated"), ("u-1", "updated"), ("u-1", "updated")],
    );
    let weak = write_batch(
        dir.path(),
        "weak.json",
        &[("u-2", "unread_with_stock"), ("u-2", "unread_with_stock")],
    );
    ingest_json(dir.path(), "st-weak", "label", &weak);
    ingest_json(dir.path(), "st-strong", "label", &strong);

    let output = shelf_cmd(dir.path())
        .args(["ranking", "--date", "2026-03-14", "--json"])
        .output()
        .expect("ranking should not crash");
    assert!(output.status.success());

    let board: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let rows = board.as_array().expect("board is an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["entity_id"], "st-strong");
    assert_eq!(rows[0]["position"], 1);
    assert_eq!(rows[1]["entity_id"], "st-weak");
}

#[test]
fn achievements_and_xp_reflect_an_ingest() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());
    let batch = write_batch(dir.path(), "batch.json", &[("u-7", "updated")]);
    let report = ingest_json(dir.path(), "st-042", "label", &batch);

    let unlocked: Vec<&str> = report["newly_unlocked"]
        .as_array()
        .expect("unlocked array")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(unlocked.contains(&"first-update"), "unlocked: {unlocked:?}");

    let output = shelf_cmd(dir.path())
        .args(["achievements", "u-7", "--unlocked", "--json"])
        .output()
        .expect("achievements should not crash");
    assert!(output.status.success());
    let rows: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(
        rows.as_array()
            .expect("rows array")
            .iter()
            .any(|row| row["id"] == "first-update")
    );

    let output = shelf_cmd(dir.path())
        .args(["xp", "u-7", "--json"])
        .output()
        .expect("xp should not crash");
    assert!(output.status.success());
    let xp: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let total = xp["total_xp"].as_u64().expect("total_xp");
    let parts = xp["xp_from_activities"].as_u64().expect("activities")
        + xp["xp_from_achievements"].as_u64().expect("achievements");
    assert_eq!(total, parts);
    assert!(total >= 50);
}

#[test]
fn reingesting_the_same_batch_is_stable() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());
    let batch = write_batch(
        dir.path(),
        "batch.json",
        &[("u-1", "updated"), ("u-1", "outdated")],
    );

    let first = ingest_json(dir.path(), "st-042", "label", &batch);
    let second = ingest_json(dir.path(), "st-042", "label", &batch);

    assert_eq!(first["composite_score"], second["composite_score"]);
    assert_eq!(first["rank_position"], second["rank_position"]);
    assert!(second["newly_unlocked"].as_array().expect("array").is_empty());
}

#[test]
fn unknown_statuses_surface_as_warnings_not_failures() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());
    let batch = write_batch(
        dir.path(),
        "batch.json",
        &[("u-1", "updated"), ("u-1", "mystery-status")],
    );

    let report = ingest_json(dir.path(), "st-042", "label", &batch);
    assert_eq!(report["success"], true);
    let problems = report["problems"].as_array().expect("problems array");
    assert!(problems.iter().any(|p| p["code"] == "E2002"));
}

#[test]
fn portuguese_aliases_normalize() {
    let dir = TempDir::new().expect("temp dir");
    init_data_dir(dir.path());
    let batch = write_batch(
        dir.path(),
        "batch.json",
        &[("u-1", "Atualizado"), ("u-1", "Desatualizado")],
    );

    let report = ingest_json(dir.path(), "st-042", "label", &batch);
    assert!(report["problems"].as_array().expect("problems").is_empty());

    let output = shelf_cmd(dir.path())
        .args(["snapshot", "st-042", "--date", "2026-03-14", "--json"])
        .output()
        .expect("snapshot should not crash");
    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(snapshot["total_items"], 2);
    assert_eq!(snapshot["items_updated"], 1);
}
