use assert_cmd::Command;
use predicates::prelude::*;

fn antipat() -> Command {
    Command::cargo_bin("antipat-cli").unwrap()
}

#[test]
fn lists_full_catalogue_by_default() {
    antipat()
        .arg("list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("HARDCODED_SECRET"))
        .stdout(predicate::str::contains("Python"))
        .stdout(predicate::str::contains("JavaScript"))
        .stdout(predicate::str::contains("Go"))
        .stdout(predicate::str::contains("Rust"));
}

#[test]
fn language_filter_restricts_output() {
    antipat()
        .args(["list-rules", "--language", "python"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MUTABLE_DEFAULT_ARG"))
        .stdout(predicate::str::contains("IGNORED_ERROR").not());
}

#[test]
fn json_output_serializes_rules() {
    antipat()
        .args(["list-rules", "--language", "go", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"IGNORED_ERROR\""))
        .stdout(predicate::str::contains("\"language\": \"go\""));
}

#[test]
fn unknown_language_is_rejected() {
    antipat()
        .args(["list-rules", "--language", "cobol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown language"));
}
