//! CLI parsing tests for the snlocest command
//!
//! Tests that verify CLI argument parsing works correctly.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the snlocest binary
#[allow(deprecated)]
fn snlocest() -> Command {
    Command::cargo_bin("snlocest").expect("Failed to find snlocest binary")
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_shows_all_commands() {
    snlocest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("kfold"))
        .stdout(predicate::str::contains("loocv"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    snlocest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("snlocest"));
}

// ============================================================================
// Global Options Tests
// ============================================================================

#[test]
fn test_global_options_in_help() {
    snlocest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("--backend"))
        .stdout(predicate::str::contains("--area-db"))
        .stdout(predicate::str::contains("--delimiter"));
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    snlocest()
        .args(["--verbose", "--quiet", "stats", "e.tsv", "l.tsv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_backend_rejected() {
    snlocest()
        .args(["--backend", "matrix", "stats", "e.tsv", "l.tsv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown graph backend"));
}

// ============================================================================
// Kfold Command Tests
// ============================================================================

#[test]
fn test_kfold_help() {
    snlocest()
        .args(["kfold", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--n-splits"))
        .stdout(predicate::str::contains("--random-state"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--nth"))
        .stdout(predicate::str::contains("--jobs"))
        .stdout(predicate::str::contains("--extra"));
}

#[test]
fn test_kfold_requires_target() {
    snlocest()
        .args(["kfold", "e.tsv", "l.tsv", "mv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_kfold_output_dir_conflicts_with_nth() {
    snlocest()
        .args([
            "kfold",
            "e.tsv",
            "l.tsv",
            "mv",
            "--output-dir",
            "out",
            "--nth",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_method_lists_choices() {
    snlocest()
        .args(["kfold", "e.tsv", "l.tsv", "svm", "--nth", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown method: svm"))
        .stderr(predicate::str::contains("mv, gm, rn, nn, pm"));
}

#[test]
fn test_method_long_name_accepted() {
    // Parsing succeeds; the missing input file is what fails
    snlocest()
        .args([
            "--quiet",
            "kfold",
            "missing-edges.tsv",
            "missing-labels.tsv",
            "majority_vote",
            "--nth",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load dataset"));
}

// ============================================================================
// Loocv, Evaluate, Stats, Config Command Tests
// ============================================================================

#[test]
fn test_loocv_help() {
    snlocest()
        .args(["loocv", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fast"))
        .stdout(predicate::str::contains("--extra"))
        .stdout(predicate::str::contains("--jobs"));
}

#[test]
fn test_evaluate_help() {
    snlocest()
        .args(["evaluate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--random-state"))
        .stdout(predicate::str::contains("--n-splits"))
        .stdout(predicate::str::contains("--stem"))
        .stdout(predicate::str::contains("--ext"));
}

#[test]
fn test_stats_help() {
    snlocest()
        .args(["stats", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_config_help() {
    snlocest()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("path"));
}

#[test]
fn test_config_init_help() {
    snlocest()
        .args(["config", "init", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--global"));
}
