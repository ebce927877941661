use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("scalewatch.toml");
    fs::write(&path, body).unwrap();
    path
}

fn bin() -> Command {
    Command::cargo_bin("scalewatch").unwrap()
}

#[test]
fn self_check_passes_with_valid_config() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("image.eeprom");
    let cfg = write_config(
        &dir,
        &format!(
            r#"
[pins]
hx711_dt = 5
hx711_sck = 6
buzzer = 17
relay = 27
keypad_rows = [16, 20, 21, 26]
keypad_cols = [13, 19, 12, 11]

[store]
path = "{}"
"#,
            store.display()
        ),
    );

    bin()
        .args(["--config", cfg.to_str().unwrap(), "self-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check ok"));
}

#[test]
fn self_check_passes_without_a_config_file() {
    let dir = tempdir().unwrap();
    bin()
        .current_dir(dir.path())
        .args(["--config", "does-not-exist.toml", "self-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check ok"));
}

#[test]
fn invalid_keypad_matrix_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_config(
        &dir,
        r#"
[pins]
hx711_dt = 5
hx711_sck = 6
buzzer = 17
relay = 27
keypad_rows = [16, 20, 21]
keypad_cols = [13, 19, 12, 11]
"#,
    );

    bin()
        .args(["--config", cfg.to_str().unwrap(), "self-check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("keypad"));
}

#[test]
fn zero_control_period_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_config(
        &dir,
        r#"
[timing]
control_period_ms = 0
"#,
    );

    bin()
        .args(["--config", cfg.to_str().unwrap(), "self-check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("control_period_ms"));
}

#[test]
fn help_names_both_subcommands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("self-check"));
}

#[test]
fn json_mode_emits_structured_fatal_errors() {
    let dir = tempdir().unwrap();
    let cfg = write_config(
        &dir,
        r#"
[timing]
pulse_ms = 0
"#,
    );

    bin()
        .args(["--config", cfg.to_str().unwrap(), "--json", "self-check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"event\":\"fatal\""));
}
