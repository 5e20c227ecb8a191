//! End-to-end tests for the `frontier` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

// =============================================================================
// TEST FIXTURES
// =============================================================================

fn frontier() -> Command {
    let mut cmd = Command::cargo_bin("frontier").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("FRONTIER_UNIVERSE");
    cmd
}

const THREE_ASSETS: &str = r#"
covariance = [
    [0.0004, 0.0002, 0.0000],
    [0.0002, 0.0049, 0.0021],
    [0.0000, 0.0021, 0.0400],
]

[[assets]]
name = "Cash"
expected_return = 0.02

[[assets]]
name = "Bonds"
expected_return = 0.05

[[assets]]
name = "Equity"
expected_return = 0.11

[engine]
frontier_points = 25
"#;

fn universe_file(text: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_help_lists_commands() {
    frontier()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("universe"))
        .stdout(predicate::str::contains("optimize"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("recommend"));
}

#[test]
fn test_missing_universe_file() {
    frontier()
        .args(["--universe", "/nonexistent/funds.toml", "universe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Universe error"));
}

// =============================================================================
// UNIVERSE
// =============================================================================

#[test]
fn test_universe_table() {
    frontier()
        .arg("universe")
        .assert()
        .success()
        .stdout(predicate::str::contains("A Money Market"))
        .stdout(predicate::str::contains("J Growth Select"))
        .stdout(predicate::str::contains("%"));
}

#[test]
fn test_universe_json() {
    let json = stdout_json(frontier().args(["universe", "--format", "json"]));
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows[0]["volatility"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_universe_template_round_trips() {
    let output = frontier()
        .args(["universe", "--template"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let file = universe_file(&String::from_utf8(output).unwrap(), ".toml");

    frontier()
        .arg("--universe")
        .arg(file.path())
        .args(["universe", "--format", "minimal"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("A Money Market\n"));
}

// =============================================================================
// OPTIMIZE AND BUILD
// =============================================================================

#[test]
fn test_optimize_min_variance_json() {
    let json = stdout_json(frontier().args(["optimize", "--format", "json"]));
    assert_eq!(json["success"], true);
    let sum: f64 = json["weights"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w.as_f64().unwrap())
        .sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn test_optimize_projected_gradient() {
    frontier()
        .args(["--solver", "projected-gradient", "optimize", "--target-return", "0.08"])
        .args(["--format", "minimal"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Return: 0.0800"));
}

#[test]
fn test_optimize_conflicting_targets() {
    frontier()
        .args(["optimize", "--target-return", "0.1", "--target-risk", "0.15"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn test_build_csv() {
    let output = frontier()
        .args(["build", "--points", "10", "--format", "csv"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("index,target_return,expected_return,volatility,max_drawdown")
    );
    let rows = lines.count();
    assert!((1..=10).contains(&rows));
}

#[test]
fn test_build_rejects_zero_points() {
    frontier()
        .args(["build", "--points", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid number of frontier points"));
}

// =============================================================================
// RECOMMEND
// =============================================================================

#[test]
fn test_recommend_table() {
    frontier()
        .args(["recommend", "--risk-score", "6", "--amount", "100000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended Allocation"))
        .stdout(predicate::str::contains("100,000.00"))
        .stdout(predicate::str::contains("Expected Return"));
}

#[test]
fn test_recommend_json_amounts() {
    let json = stdout_json(frontier().args([
        "recommend",
        "--risk-score",
        "8",
        "--amount",
        "50000",
        "--format",
        "json",
    ]));

    assert_eq!(json["fallback"], false);
    let allocated: f64 = json["plan"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["amount"].as_f64().unwrap())
        .sum();
    assert!((allocated - 50_000.0).abs() < 1e-6);
}

#[test]
fn test_recommend_invalid_inputs() {
    frontier()
        .args(["recommend", "--risk-score", "11", "--amount", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid risk score"));

    frontier()
        .args(["recommend", "--risk-score", "5", "--amount=-1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_recommend_custom_universe() {
    let toml = universe_file(THREE_ASSETS, ".toml");
    frontier()
        .arg("--universe")
        .arg(toml.path())
        .args(["recommend", "--risk-score", "1", "--amount", "1000", "--format", "minimal"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Cash\t"));

    let json = universe_file(
        r#"{
            "covariance": [[0.0004, 0.0], [0.0, 0.04]],
            "assets": [
                {"name": "Cash", "expected_return": 0.02},
                {"name": "Equity", "expected_return": 0.11}
            ]
        }"#,
        ".json",
    );
    frontier()
        .arg("--universe")
        .arg(json.path())
        .args(["recommend", "--risk-score", "10", "--amount", "1000", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Equity"));
}
