use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_studio_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("studio")
}

#[test]
fn test_profile_command_help() {
    let mut cmd = Command::new(get_studio_bin());
    cmd.arg("profile").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Inspect form-filling profiles"))
        .stdout(predicate::str::contains("fields"))
        .stdout(predicate::str::contains("template"));
}

#[test]
fn test_profile_fields_grouped_by_section() {
    let mut cmd = Command::new(get_studio_bin());
    cmd.arg("profile").arg("fields");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Personal Information"))
        .stdout(predicate::str::contains("Payment Information"))
        .stdout(predicate::str::contains("cardCVV"));
}

#[test]
fn test_profile_template_is_empty_json() {
    let mut cmd = Command::new(get_studio_bin());
    cmd.arg("profile").arg("template").arg("business");

    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(value["name"], "business");
    let fields = value["fields"].as_object().unwrap();
    assert_eq!(fields.len(), 25);
    assert!(fields.values().all(|v| v == ""));
}

#[test]
fn test_profile_template_defaults_to_default() {
    let mut cmd = Command::new(get_studio_bin());
    cmd.arg("profile").arg("template");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"default\""));
}
