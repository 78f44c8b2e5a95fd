use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_operations() {
    cargo_bin_cmd!("mlrec")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("recommend"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("predict"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("mlrec")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mlrec "));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    cargo_bin_cmd!("mlrec")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_predict_requires_numeric_movie_id() {
    cargo_bin_cmd!("mlrec")
        .args(["predict", "toy-story"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
