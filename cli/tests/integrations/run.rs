use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const RESPIRATORY_RULES: &str = r#"{
    "name": "respiratory",
    "selection": {"mode": "staged", "category_order": ["severe", "mild"]},
    "conclusion_rules": [
        {"id": "R-02", "priority": 20,
         "conditions": [{"field": "spo2", "operator": "<", "value": 92}],
         "conclusion": {"category": "severe", "description": "Hypoxaemia"}},
        {"id": "R-01", "priority": 10,
         "conditions": [{"field": "cough", "operator": "==", "value": true}],
         "conclusion": {"category": "mild", "description": "Cough only"}}
    ]
}"#;

fn write_rules(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_cli_run_builtin_grading() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run").arg("spo2=88");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hfmd-grading = 4"))
        .stdout(predicate::str::contains("Category 4 determined by rule 04-01"));
}

#[test]
fn test_cli_run_rules_file() {
    let temp_dir = TempDir::new().unwrap();
    let rules = write_rules(&temp_dir, "respiratory.json", RESPIRATORY_RULES);

    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run")
        .arg("--rules")
        .arg(&rules)
        .arg("cough=true")
        .arg("spo2=95");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("respiratory = mild"))
        .stdout(predicate::str::contains("Cough only"));
}

#[test]
fn test_cli_run_json_output() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run").arg("--builtin").arg("diagnosis").arg("--json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rule_set"], "hfmd-diagnosis");
    assert_eq!(json["category"], "unlikely");
    assert_eq!(json["outcome"], "concluded");
}

#[test]
fn test_cli_run_facts_file_with_override() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("patient.json");
    fs::write(&facts, r#"{"spo2": 88, "cough": true}"#).unwrap();
    let rules = write_rules(&temp_dir, "respiratory.json", RESPIRATORY_RULES);

    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run")
        .arg("-r")
        .arg(&rules)
        .arg("--facts-file")
        .arg(&facts)
        .arg("spo2=97");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("respiratory = mild"));
}

#[test]
fn test_cli_run_explain_verbose() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run")
        .arg("--verbose")
        .arg("--derive-vitals")
        .arg("heart_rate=175")
        .arg("temp_c=39")
        .arg("age_months=24");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Result: 2b"))
        .stdout(predicate::str::contains("hr_no_fever"))
        .stdout(predicate::str::contains("Derived along the way:"))
        .stdout(predicate::str::contains("Trace ("));
}

#[test]
fn test_cli_run_no_match_is_undetermined() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run").arg("rash_hf=false");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hfmd-grading = undetermined"));
}

#[test]
fn test_cli_run_invalid_fact() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run").arg("spo2");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse fact 'spo2'"));
}

#[test]
fn test_cli_run_invalid_rules_file() {
    let temp_dir = TempDir::new().unwrap();
    let rules = write_rules(
        &temp_dir,
        "broken.json",
        r#"{"conclusion_rules": [
    {"id": "r1", "conclusion": {"category": "a"}},
    {"id": "r1", "conclusion": {"category": "b"}}
]}"#,
    );

    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("run").arg("-r").arg(&rules);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate rule id 'r1'"));
}

#[test]
fn test_cli_unknown_builtin() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("show").arg("--builtin").arg("treatment");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown built-in rule set 'treatment'"));
}

#[test]
fn test_cli_show() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("show").arg("-b").arg("grading");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hfmd-grading (staged selection)"))
        .stdout(predicate::str::contains("INT-01"))
        .stdout(predicate::str::contains("04-01"));
}

#[test]
fn test_cli_stats_json() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("stats").arg("--json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_rules"], 38);
    assert_eq!(json["counts_by_category"]["4"], 14);
}

#[test]
fn test_cli_list() {
    let temp_dir = TempDir::new().unwrap();
    write_rules(&temp_dir, "respiratory.json", RESPIRATORY_RULES);
    write_rules(&temp_dir, "notes.json", r#"{"hello": "#);
    write_rules(&temp_dir, "readme.txt", "not a rule file");

    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("list").arg(temp_dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Found 2 rule file(s), 1 valid"))
        .stdout(predicate::str::contains("respiratory (staged), 2 rules"))
        .stdout(predicate::str::contains("notes.json: invalid"));
}
