use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const KNOWN_BRANCH: &str = "{\n    let x := 7\n    if lt(x, 8) { sstore(0, 1) }\n    if gt(x, 8) { sstore(0, 2) }\n}\n";

fn yulir() -> Command {
    Command::cargo_bin("yulir").unwrap()
}

fn write_input(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

#[test]
fn optimize_rewrites_constant_conditions() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "branch.yul", KNOWN_BRANCH);

    yulir()
        .arg("optimize")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("if 1"))
        .stdout(predicate::str::contains("if 0"))
        .stderr(predicate::str::contains(
            "1 condition(s) always true, 1 always false",
        ));
}

#[test]
fn optimize_json_reports_steps() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "branch.yul", KNOWN_BRANCH);

    let output = yulir()
        .args(["--json", "optimize"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &reports[0];
    assert_eq!(report["steps"][0]["name"], "ReasoningBasedSimplifier");
    assert!(report["code"].as_str().unwrap().contains("if 1"));
}

#[test]
fn optimize_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "branch.yul", KNOWN_BRANCH);
    let output = dir.path().join("out.yul");

    yulir()
        .arg("optimize")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("if 1"));
    assert!(written.contains("sstore(0, 2)"));
}

#[test]
fn optimize_output_requires_single_file() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, "a.yul", KNOWN_BRANCH);
    write_input(&dir, "b.yul", KNOWN_BRANCH);

    yulir()
        .arg("optimize")
        .arg(dir.path())
        .arg("--output")
        .arg(dir.path().join("out.yul"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one input file"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    write_input(&dir, "good.yul", KNOWN_BRANCH);
    write_input(&dir, "notes.txt", "not ir");

    yulir()
        .arg("validate")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"))
        .stdout(predicate::str::contains("good.yul"))
        .stdout(predicate::str::contains("notes.txt").not());
}

#[test]
fn validate_rejects_malformed_input() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "broken.yul", "{ let x := }");

    yulir()
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn settings_from_file_and_flag() {
    let dir = TempDir::new().unwrap();
    let settings = write_input(
        &dir,
        "settings.json",
        r#"{"evmVersion": "byzantium", "revertStrings": "debug"}"#,
    );

    let output = yulir()
        .args(["--json", "settings", "--settings"])
        .arg(&settings)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["settings"]["evmVersion"], "byzantium");
    assert_eq!(report["settings"]["revertStrings"], "debug");
    assert_eq!(report["bitwise_shifting"], false);
    let expected_prover = if cfg!(feature = "smt") { "z3" } else { "eval" };
    assert_eq!(report["prover"], expected_prover);

    let output = yulir()
        .args(["--json", "settings", "--evm-version", "constantinople", "--settings"])
        .arg(&settings)
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["settings"]["evmVersion"], "constantinople");
    assert_eq!(report["bitwise_shifting"], true);
}

#[test]
fn unknown_evm_version_fails() {
    yulir()
        .args(["settings", "--evm-version", "frontier"])
        .assert()
        .failure();
}
