use assert_cmd::Command;

#[test]
fn test_server_command_available() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("server"));
}

#[test]
fn test_server_rejects_missing_rule_file() {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.arg("server")
        .arg("--grading-rules")
        .arg("does-not-exist.json");

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Failed to read rule file"));
}

#[test]
fn test_server_logs_rule_file_warnings_before_starting() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("grading.json");
    std::fs::write(
        &path,
        r#"{"conclusion_rules": [
            {"id": "r1", "conditions": [{"type": "XOR", "conditions": []}],
             "conclusion": {"category": "a"}}
        ]}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("server")
        .arg("--grading-rules")
        .arg(&path)
        .arg("--host")
        .arg("not-an-address");

    cmd.assert().failure().stderr(predicates::str::contains(
        "unrecognized condition group 'XOR'",
    ));
}
