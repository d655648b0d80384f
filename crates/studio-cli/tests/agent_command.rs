use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_studio_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("studio")
}

#[test]
fn test_agent_kinds_lists_all() {
    let mut cmd = Command::new(get_studio_bin());
    cmd.arg("agent").arg("kinds");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("* browser-use"))
        .stdout(predicate::str::contains("web-scraper"))
        .stdout(predicate::str::contains("email-automation"))
        .stdout(predicate::str::contains("custom"));
}

#[test]
fn test_agent_kinds_table() {
    let mut cmd = Command::new(get_studio_bin());
    cmd.arg("--format").arg("table").arg("agent").arg("kinds");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("Kind,Label"));
}
