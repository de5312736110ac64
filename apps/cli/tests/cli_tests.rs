//! rlink-cli 端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn cli(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rlink-cli").unwrap();
    cmd.arg("--config").arg(config).env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_scripted_session_quits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("config.toml"))
        .args(["run", "--script", "0,0,3,12,19"])
        .assert()
        .success()
        .stdout(predicate::str::contains("19: Quit"))
        .stdout(predicate::str::contains("Session ended: user quit"));
}

#[test]
fn test_dump_prints_telemetry() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("config.toml"))
        .args(["run", "--script", "18,19"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Battery"))
        .stdout(predicate::str::contains("Host modal selection"));
}

#[test]
fn test_invalid_script_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("config.toml"))
        .args(["run", "--script", "0,99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid action"));
}

#[test]
fn test_stdin_eof_ends_session() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("config.toml"))
        .arg("run")
        .write_stdin("1\n4\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("Session ended: user quit"));
}

#[test]
fn test_config_init_show_and_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rlink").join("config.toml");

    cli(&path).args(["config", "path"]).assert().success().stdout(
        predicate::str::contains(path.to_string_lossy().as_ref()),
    );

    cli(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(path.exists());

    cli(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cli(&path).args(["config", "init", "--force"]).assert().success();

    cli(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[session]"))
        .stdout(predicate::str::contains("data_period_ms = 100"));
}
