//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("YMLINT_LOG_LEVEL")
        .env_remove("YMLINT_LOG_PATH")
        .env_remove("YMLINT_LOG_DIR");
    cmd
}

/// Command running inside `dir`, with user config lookups pointed at `dir` too.
fn cmd_in(dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .arg("--color")
        .arg("never");
    cmd
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

fn lint_json(dir: &Path, args: &[&str]) -> (Option<i32>, Value) {
    let output = cmd_in(dir)
        .args(["--json", "lint"])
        .args(args)
        .output()
        .expect("failed to run command");
    let json = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON ({e}); stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        )
    });
    (output.status.code(), json)
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn long_help_lists_environment_variables() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("YMLINT_LOG_DIR"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    let tmp = TempDir::new().unwrap();
    cmd_in(tmp.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let tmp = TempDir::new().unwrap();
    let output = cmd_in(tmp.path())
        .arg("info")
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["config"]["max_input_bytes"], 5 * 1024 * 1024);
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_and_verbose_flags_accepted() {
    let tmp = TempDir::new().unwrap();
    for flag in ["--quiet", "-q", "--verbose", "-v", "-vv"] {
        cmd_in(tmp.path()).args([flag, "info"]).assert().success();
    }
}

#[test]
fn color_choices_accepted() {
    let tmp = TempDir::new().unwrap();
    for choice in ["auto", "always", "never"] {
        cmd().current_dir(tmp.path()).args(["--color", choice, "info"]).assert().success();
    }
}

#[test]
fn log_dir_env_writes_jsonl_logs() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    write(tmp.path(), "a.yaml", "a: 1\n");
    cmd_in(tmp.path())
        .env("YMLINT_LOG_DIR", &logs)
        .env("YMLINT_LOG_LEVEL", "debug")
        .args(["lint", "a.yaml"])
        .assert()
        .success();
    let entries: Vec<_> = fs::read_dir(&logs).unwrap().collect();
    assert!(!entries.is_empty(), "a log file should be created");
}

// =============================================================================
// Lint Command
// =============================================================================

#[test]
fn lint_help_shows_usage() {
    cmd()
        .args(["lint", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--min-level"))
        .stdout(predicate::str::contains("--strict"));
}

#[test]
fn lint_requires_files() {
    cmd().arg("lint").assert().code(2).stderr(predicate::str::contains("FILE"));
}

#[test]
fn lint_clean_file_succeeds_silently() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "clean.yaml", "key: value\nlist:\n  - 1\n");
    cmd_in(tmp.path())
        .args(["lint", "clean.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn lint_reports_problems_and_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "bad.yaml", "a: 1 \n\n\n\nb: 2\n");
    cmd_in(tmp.path())
        .args(["lint", "bad.yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("bad.yaml"))
        .stdout(predicate::str::contains("trailing spaces"))
        .stdout(predicate::str::contains("(trailing-spaces)"))
        .stdout(predicate::str::contains("too many blank lines (3 >= 2)"));
}

#[test]
fn lint_json_lists_problems_in_order() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "bad.yaml", "a: 1 \n\n\n\nb: 2\n");
    let (code, json) = lint_json(tmp.path(), &["bad.yaml"]);
    assert_eq!(code, Some(1));
    assert_eq!(json["errors"], 2);
    assert_eq!(json["warnings"], 0);
    let problems = json["files"][0]["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0]["rule"], "trailing-spaces");
    assert_eq!(problems[0]["line"], 1);
    assert_eq!(problems[0]["column"], 5);
    assert_eq!(problems[1]["rule"], "empty-lines");
    assert_eq!(problems[1]["line"], 4);
    assert_eq!(problems[1]["level"], "error");
}

#[test]
fn lint_honors_directives() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "ok.yaml",
        "a: 1 # ymlint disable-line rule:trailing-spaces  \nb: 2\n",
    );
    cmd_in(tmp.path()).args(["lint", "ok.yaml"]).assert().success();
}

#[test]
fn lint_reports_syntax_errors_when_token_rules_run() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".ymlint.yaml", "rules:\n  document-start: enable\n");
    write(tmp.path(), "broken.yaml", "---\na: [1, 2\n");
    let (code, json) = lint_json(tmp.path(), &["broken.yaml"]);
    assert_eq!(code, Some(1));
    let problems = json["files"][0]["problems"].as_array().unwrap();
    assert!(
        problems.iter().any(|p| p["rule"] == "syntax"),
        "expected a syntax finding: {problems:?}"
    );
}

#[test]
fn lint_warnings_pass_unless_strict() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        ".ymlint.toml",
        "[rules.trailing-spaces]\nlevel = \"warning\"\n",
    );
    write(tmp.path(), "warn.yaml", "a: 1 \n");

    cmd_in(tmp.path())
        .args(["lint", "warn.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning"));
    cmd_in(tmp.path())
        .args(["lint", "--strict", "warn.yaml"])
        .assert()
        .code(2);
    cmd_in(tmp.path())
        .args(["lint", "--strict", "--min-level", "error", "warn.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn lint_multiple_files_reports_each() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "one.yaml", "a: 1\n");
    write(tmp.path(), "two.yaml", "b: 2 \n");
    let (code, json) = lint_json(tmp.path(), &["one.yaml", "two.yaml"]);
    assert_eq!(code, Some(1));
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0]["problems"].as_array().unwrap().is_empty());
    assert_eq!(files[1]["file"], "two.yaml");
}

#[test]
fn lint_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    cmd_in(tmp.path())
        .args(["lint", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yaml"));
}

#[test]
fn lint_rejects_oversized_input() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".ymlint.toml", "max_input_bytes = 8\n");
    write(tmp.path(), "big.yaml", "key: a long value\n");
    cmd_in(tmp.path())
        .args(["lint", "big.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input too large"));
}

// =============================================================================
// Rules Command
// =============================================================================

#[test]
fn rules_lists_catalog() {
    let tmp = TempDir::new().unwrap();
    cmd_in(tmp.path())
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("empty-lines"))
        .stdout(predicate::str::contains("max-start"))
        .stdout(predicate::str::contains("trailing-spaces"))
        .stdout(predicate::str::contains("document-start"));
}

#[test]
fn rules_json_reports_enabled_state() {
    let tmp = TempDir::new().unwrap();
    let output = cmd_in(tmp.path())
        .args(["rules", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rules: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    let find = |id: &str| rules.iter().find(|r| r["id"] == id).unwrap().clone();
    assert_eq!(find("empty-lines")["enabled"], true);
    assert_eq!(find("empty-lines")["granularity"], "line");
    assert_eq!(find("document-start")["enabled"], false);
    assert_eq!(find("document-start")["granularity"], "token");
}

#[test]
fn rules_enabled_filters_by_config() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".ymlint.yaml", "rules:\n  trailing-spaces: disable\n");
    cmd_in(tmp.path())
        .args(["rules", "--enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("empty-lines"))
        .stdout(predicate::str::contains("trailing-spaces").not());
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_min_level_shows_error() {
    cmd()
        .args(["lint", "--min-level", "fatal", "a.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fatal"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
