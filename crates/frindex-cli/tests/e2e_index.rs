//! E2E CLI tests covering:
//! - `fri init` / `fri import` setup
//! - the year index (`fri index`) with parent/child agencies
//! - agency-year and grouping breakdowns (`fri agency`, `fri grouping`)
//! - checkpoints and the status cache (`fri checkpoint`, `fri update-cache`)
//! - coded error output
//!
//! Each test runs `fri` as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn fri_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fri"));
    cmd.current_dir(dir);
    cmd.env("FRINDEX_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd.env_remove("FRINDEX_DB");
    cmd
}

fn bundle() -> Value {
    json!({
        "agencies": [
            { "id": 1, "name": "Environmental Protection Agency", "slug": "environmental-protection-agency" },
            { "id": 2, "name": "Air Office", "slug": "air-office", "parent_id": 1 },
            { "id": 3, "name": "Bureau of Land Management" }
        ],
        "dockets": [
            { "id": "EPA-HQ-2020-0001", "comments_count": 12 }
        ],
        "regulatory_plans": [
            {
                "regulation_id_number": "2060-AA01",
                "issue": "202004",
                "title": "Ozone standards",
                "priority_category": "Economically Significant"
            }
        ],
        "entries": [
            {
                "id": 10,
                "title": "Ozone standards for Ohio",
                "document_number": "2020-00010",
                "publication_date": "2020-03-02",
                "toc_subject": "Air quality",
                "toc_doc": "Ohio",
                "granule_class": "RULE",
                "start_page": 100,
                "end_page": 102,
                "agency_ids": [1],
                "regulation_id_numbers": ["2060-AA01"]
            },
            {
                "id": 11,
                "title": "Ozone standards for Iowa",
                "document_number": "2020-00011",
                "publication_date": "2020-07-01",
                "toc_subject": "Air quality",
                "toc_doc": "Iowa",
                "granule_class": "RULE",
                "docket_id": "EPA-HQ-2020-0001",
                "agency_ids": [1],
                "comments_close_on": "2020-08-31"
            },
            {
                "id": 12,
                "title": "Advisory committee meetings",
                "document_number": "2020-00012",
                "publication_date": "2020-05-01",
                "toc_doc": "Meetings",
                "granule_class": "NOTICE",
                "agency_ids": [1, 2]
            },
            {
                "id": 13,
                "title": "Grazing permits",
                "document_number": "2020-00013",
                "publication_date": "2020-02-03",
                "toc_subject": "Land",
                "fr_index_subject": "Grazing",
                "toc_doc": "Permits",
                "granule_class": "PRORULE",
                "agency_ids": [3]
            },
            {
                "id": 14,
                "title": "Year-end notice",
                "document_number": "2019-00014",
                "publication_date": "2019-12-30",
                "toc_doc": "Holiday schedule",
                "granule_class": "NOTICE",
                "agency_ids": [1]
            }
        ],
        "checkpoints": [
            { "year": 2020, "agency_id": 1, "last_completed_issue": "2020-06-01" }
        ]
    })
}

/// Initialize and import the standard bundle into a fresh directory.
fn setup() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fri_cmd(dir.path()).args(["init"]).assert().success();

    let bundle_path = dir.path().join("bundle.json");
    std::fs::write(&bundle_path, bundle().to_string()).expect("write bundle");
    fri_cmd(dir.path())
        .args(["import", "--file"])
        .arg(&bundle_path)
        .assert()
        .success();
    dir
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = fri_cmd(dir)
        .args(args)
        .args(["--format", "json"])
        .output()
        .expect("fri should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

fn find_agency<'a>(index: &'a Value, slug: &str) -> &'a Value {
    index["letters"]
        .as_array()
        .expect("letters array")
        .iter()
        .flat_map(|group| group["agencies"].as_array().expect("agencies array"))
        .find(|agency| agency["slug"] == slug)
        .unwrap_or_else(|| panic!("agency {slug} missing from index"))
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_database() {
    let dir = TempDir::new().expect("temp dir");
    let json = run_json(dir.path(), &["init"]);
    assert_eq!(json["config_written"], true);
    assert_eq!(json["schema_version"], 3);
    assert!(dir.path().join(".frindex/config.toml").is_file());
    assert!(dir.path().join(".frindex/index.db").is_file());

    let again = run_json(dir.path(), &["init"]);
    assert_eq!(again["config_written"], false);
}

#[test]
fn import_reports_counts() {
    let dir = TempDir::new().expect("temp dir");
    fri_cmd(dir.path()).args(["init"]).assert().success();
    let bundle_path = dir.path().join("bundle.json");
    std::fs::write(&bundle_path, bundle().to_string()).expect("write bundle");

    let summary = run_json(
        dir.path(),
        &["import", "--file", bundle_path.to_str().expect("utf8 path")],
    );
    assert_eq!(summary["agencies"], 3);
    assert_eq!(summary["entries"], 5);
    assert_eq!(summary["checkpoints"], 1);
}

#[test]
fn commands_before_init_fail_with_not_initialized() {
    let dir = TempDir::new().expect("temp dir");
    fri_cmd(dir.path())
        .args(["index", "--year", "2020"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn years_lists_configured_range() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::create_dir_all(dir.path().join(".frindex")).expect("mkdir");
    std::fs::write(
        dir.path().join(".frindex/config.toml"),
        "[years]\nmin = 2018\nmax = 2020\n",
    )
    .expect("write config");

    let json = run_json(dir.path(), &["years"]);
    assert_eq!(json["years"], json!([2020, 2019, 2018]));

    fri_cmd(dir.path())
        .args(["years", "--format", "text"])
        .assert()
        .success()
        .stdout("2020\n2019\n2018\n");
}

// ---------------------------------------------------------------------------
// Year index
// ---------------------------------------------------------------------------

#[test]
fn index_groups_agencies_by_letter_with_children_nested() {
    let dir = setup();
    let index = run_json(dir.path(), &["index", "--year", "2020"]);

    let letters: Vec<&str> = index["letters"]
        .as_array()
        .expect("letters")
        .iter()
        .map(|group| group["letter"].as_str().expect("letter"))
        .collect();
    assert_eq!(letters, vec!["A", "B", "E"]);
    assert_eq!(index["agency_count"], 3);

    let epa = find_agency(&index, "environmental-protection-agency");
    // Entry 12 is shared with the child and entry 14 is from 2019.
    assert_eq!(epa["entry_count"], 2);
    assert_eq!(epa["children"][0]["slug"], "air-office");
    assert_eq!(epa["children"][0]["entry_count"], 1);

    let blm = find_agency(&index, "bureau-of-land-management");
    assert_eq!(blm["entry_count"], 1);
}

#[test]
fn index_rejects_unavailable_year() {
    let dir = setup();
    fri_cmd(dir.path())
        .args(["index", "--year", "1999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn update_cache_refreshes_needs_attention_counts() {
    let dir = setup();
    let report = run_json(dir.path(), &["update-cache", "--year", "2020"]);
    assert_eq!(report["updated"].as_array().expect("updated").len(), 3);

    let index = run_json(dir.path(), &["index", "--year", "2020"]);
    // Iowa was published after the checkpoint; Ohio before it.
    assert_eq!(
        find_agency(&index, "environmental-protection-agency")["needs_attention_count"],
        1
    );
    assert_eq!(find_agency(&index, "air-office")["needs_attention_count"], 1);
    // The only grouping carries an editor override.
    assert_eq!(
        find_agency(&index, "bureau-of-land-management")["needs_attention_count"],
        0
    );
}

#[test]
fn index_right_after_import_computes_uncached_counts() {
    let dir = setup();
    let index = run_json(dir.path(), &["index", "--year", "2020"]);

    // The imported checkpoint is not a cached count; it must agree with the
    // agency view.
    let agency = run_json(
        dir.path(),
        &["agency", "environmental-protection-agency", "--year", "2020"],
    );
    assert_eq!(agency["needs_attention_count"], 1);
    assert_eq!(
        find_agency(&index, "environmental-protection-agency")["needs_attention_count"],
        agency["needs_attention_count"]
    );
    assert_eq!(find_agency(&index, "air-office")["needs_attention_count"], 1);
}

// ---------------------------------------------------------------------------
// Agency-year and grouping breakdowns
// ---------------------------------------------------------------------------

#[test]
fn agency_breaks_entries_into_types_and_groupings() {
    let dir = setup();
    let report = run_json(
        dir.path(),
        &["agency", "environmental-protection-agency", "--year", "2020"],
    );

    assert_eq!(report["entry_count"], 2);
    assert_eq!(report["last_completed_issue"], "2020-06-01");
    assert_eq!(report["last_issue"], "2020-07-01");
    assert_eq!(report["needs_attention_count"], 1);

    let types = report["document_types"].as_array().expect("types");
    assert_eq!(types.len(), 1);
    assert_eq!(types[0]["code"], "RULE");

    let subject = &types[0]["groupings"][0];
    assert_eq!(subject["kind"], "subject");
    assert_eq!(subject["header"], "Air quality");
    assert_eq!(subject["documents"][0]["header"], "Iowa");
    assert_eq!(subject["documents"][0]["needs_attention"], true);
    assert_eq!(subject["documents"][0]["comments_open"], false);
    assert_eq!(subject["documents"][0]["entries"][0]["comment_count"], 12);
    assert_eq!(subject["documents"][1]["header"], "Ohio");
    assert_eq!(subject["documents"][1]["needs_attention"], false);
    assert_eq!(subject["documents"][1]["significant"], true);
    assert_eq!(subject["documents"][1]["entries"][0]["page_range"], "100-102");
}

#[test]
fn agency_max_date_limits_the_window() {
    let dir = setup();
    let report = run_json(
        dir.path(),
        &[
            "agency",
            "1",
            "--year",
            "2020",
            "--max-date",
            "2020-06-30",
        ],
    );
    assert_eq!(report["max_date"], "2020-06-30");
    assert_eq!(report["entry_count"], 1);
    assert_eq!(report["needs_attention_count"], 0);
}

#[test]
fn unknown_agency_fails_with_code() {
    let dir = setup();
    fri_cmd(dir.path())
        .args(["agency", "no-such-agency", "--year", "2020", "--format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
}

#[test]
fn grouping_returns_one_grouping() {
    let dir = setup();
    let report = run_json(
        dir.path(),
        &[
            "grouping",
            "bureau-of-land-management",
            "--year",
            "2020",
            "--type",
            "PRORULE",
            "--header",
            "Grazing",
        ],
    );
    assert_eq!(report["grouping"]["kind"], "subject");
    assert_eq!(report["grouping"]["needs_attention_count"], 0);
    assert_eq!(report["grouping"]["documents"][0]["header"], "Permits");
}

#[test]
fn grouping_miss_fails_with_code() {
    let dir = setup();
    fri_cmd(dir.path())
        .args([
            "grouping",
            "bureau-of-land-management",
            "--year",
            "2020",
            "--type",
            "PRORULE",
            "--header",
            "Land",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

#[test]
fn checkpoint_clears_attention_and_updates_cache() {
    let dir = setup();
    let report = run_json(
        dir.path(),
        &["checkpoint", "air-office", "--year", "2020", "--date", "2020-05-01"],
    );
    assert_eq!(report["last_completed_issue"], "2020-05-01");
    assert_eq!(report["needs_attention_count"], 0);

    let index = run_json(dir.path(), &["index", "--year", "2020"]);
    assert_eq!(find_agency(&index, "air-office")["needs_attention_count"], 0);
}

#[test]
fn text_output_is_tab_separated() {
    let dir = setup();
    fri_cmd(dir.path())
        .args(["agency", "environmental-protection-agency", "--year", "2020", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RULE\tAir quality\tIowa\t1\t1"));
}
