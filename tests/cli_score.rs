//! End-to-end tests for the `score` and `validate` commands

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LOG_SPECIFICATIONS: &str = "type code message\n\
INFO ALIGNMENT_INFO {} in document {}: gold entity {} aligned to system entity {} (similarity: {})\n\
INFO AP_INFO {} in document {}: gold {} system {} rank={} type={} label={} weight={} num_correct={} sum_precision={}\n\
INFO SIMILARITY_INFO {} in document {}: gold entity {} and system entity {} share {} mention(s): {}\n\
INFO ENTITY_TYPES_INFO {} {} document {} entity {}: types={} expanded_types={}\n\
WARNING UNEXPECTED_NUM_COLUMNS expected {} columns, found {} at {}\n\
WARNING INVALID_CONFIDENCE {} at {}\n";

const GOLD: &str = "run\tm1\tObama\tD1:0-4\tE1\tPER.Politician\tNAM\t1.0\n\
run\tm2\the\tD1:20-21\tE1\tPER.Politician\tPRO\t0.5\n\
run\tm4\tIBM\tD1:40-42\tE2\tORG\tNAM\t1.0\n";

const SYSTEM: &str = "run\tx1\tObama\tD1:0-4\tS1\tPER.Politician\tNAM\t1.0\n\
run\tx3\tBolt\tD1:30-33\tS1\tPER.Athlete\tNAM\t0.8\n\
run\tx9\tParis\tD1:60-64\tS2\tGPE\tNAM\tnot-a-number\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        fs::write(dir.path().join("specs.txt"), LOG_SPECIFICATIONS).unwrap();
        fs::write(dir.path().join("gold.tab"), GOLD).unwrap();
        fs::write(dir.path().join("system.tab"), SYSTEM).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn score(&self, extra: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("typealign").unwrap();
        cmd.arg("score")
            .arg("-l")
            .arg(self.path("log.txt"))
            .args(extra)
            .arg(self.path("specs.txt"))
            .arg(self.path("gold.tab"))
            .arg(self.path("system.tab"))
            .arg(self.path("scores"));
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
}

#[test]
fn test_score_writes_six_tables() {
    let fx = Fixture::new();
    fx.score(&[])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 6 score file(s)"));

    for code in ["cluster_v1", "cluster_v2", "cluster_v3", "mention_v1", "mention_v2", "mention_v3"] {
        assert!(fx.path("scores").join(format!("{}-scores.txt", code)).exists(), "{} missing", code);
    }

    let v1 = read(&fx.path("scores").join("cluster_v1-scores.txt"));
    let lines: Vec<&str> = v1.lines().collect();
    assert!(lines[0].starts_with("DocID"));
    // E1~S1, E2 and S2 NULL-aligned, plus the summary row
    assert_eq!(lines.len(), 5);
    assert!(lines[1].contains("E1") && lines[1].contains("S1"));
    assert!(lines.iter().any(|l| l.contains("E2") && l.contains("None")));
    assert!(lines[4].starts_with("Summary runID"));
}

#[test]
fn test_score_logs_audit_events() {
    let fx = Fixture::new();
    fx.score(&[]).assert().success();

    let log = read(&fx.path("log.txt"));
    assert!(log.contains("Execution begins"));
    assert!(log.contains("SIMILARITY_INFO - "));
    assert!(log.contains("ALIGNMENT_INFO - "));
    assert!(log.contains("AP_INFO - "));
    assert!(log.contains("ENTITY_TYPES_INFO - "));
    assert!(log.contains("WARN - INVALID_CONFIDENCE"));
}

#[test]
fn test_score_tab_separator_and_run_id() {
    let fx = Fixture::new();
    fx.score(&["-S", "tab", "-r", "sys7"]).assert().success();

    let v2 = read(&fx.path("scores").join("cluster_v2-scores.txt"));
    assert!(v2.starts_with("DocID\tRunID\tGoldEntityID\tSystemEntityID\tAveragePrecision\n"));
    assert!(v2.lines().skip(1).all(|l| l.split('\t').nth(1) == Some("sys7")));
}

#[test]
fn test_score_json_output() {
    let fx = Fixture::new();
    fx.score(&["--json"]).assert().success();

    let json: serde_json::Value = serde_json::from_str(&read(&fx.path("scores").join("scores.json"))).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 6);
}

#[test]
fn test_score_mention_type_filter() {
    let fx = Fixture::new();
    fx.score(&["--mention-types", "PRO"]).assert().success();

    // only the gold pronoun survives
    let v1 = read(&fx.path("scores").join("mention_v1-scores.txt"));
    assert_eq!(v1.lines().count(), 3);
    assert!(v1.contains("m2"));
}

#[test]
fn test_score_rejects_unknown_mention_type() {
    let fx = Fixture::new();
    fx.score(&["--mention-types", "XYZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mention type"));
}

#[test]
fn test_score_refuses_existing_output() {
    let fx = Fixture::new();
    fs::create_dir(fx.path("scores")).unwrap();
    fx.score(&[])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists"));
}

#[test]
fn test_rejected_run_keeps_existing_log() {
    let fx = Fixture::new();
    fs::write(fx.path("log.txt"), "previous run\n").unwrap();
    fs::create_dir(fx.path("scores")).unwrap();
    fx.score(&[])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR: score - Path"));
    assert_eq!(read(&fx.path("log.txt")), "previous run\n");

    fs::remove_dir(fx.path("scores")).unwrap();
    fs::remove_file(fx.path("gold.tab")).unwrap();
    fx.score(&[])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert_eq!(read(&fx.path("log.txt")), "previous run\n");
}

#[test]
fn test_score_closed_ontology_rejects_unknown_type() {
    let fx = Fixture::new();
    fs::write(fx.path("types.txt"), "PER\nPER.Politician\nORG\n").unwrap();
    let ontology = fx.path("types.txt");
    fx.score(&["--ontology", ontology.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PER.Athlete"));
}

#[test]
fn test_score_missing_required_event_code() {
    let fx = Fixture::new();
    fs::write(fx.path("specs.txt"), "type code message\nINFO AP_INFO {}\n").unwrap();
    fx.score(&[])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ALIGNMENT_INFO"));
}

#[test]
fn test_validate_keeps_valid_lines() {
    let fx = Fixture::new();
    fs::write(
        fx.path("boundaries.tab"),
        "document_id\tsegment_id\tstart_char\tend_char\nD1\tD1-1\t0\t50\n",
    )
    .unwrap();
    fs::write(fx.path("types.txt"), "PER\nPER.Politician\nPER.Athlete\nGPE\n").unwrap();

    Command::cargo_bin("typealign")
        .unwrap()
        .arg("validate")
        .arg("-l")
        .arg(fx.path("validate.log"))
        .arg(fx.path("specs.txt"))
        .arg(fx.path("boundaries.tab"))
        .arg(fx.path("types.txt"))
        .arg(fx.path("system.tab"))
        .arg(fx.path("validated.tab"))
        .assert()
        .success()
        .stderr(predicate::str::contains("3 line(s) read, 2 written"));

    let validated = read(&fx.path("validated.tab"));
    assert!(validated.contains("x1") && validated.contains("x3"));
    // D1:60-64 lies beyond the document boundary
    assert!(!validated.contains("x9"));
}
