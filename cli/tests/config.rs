use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn estate_command(estate_home: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("estate")?;
    cmd.env("ESTATE_HOME", estate_home);
    cmd.env_remove("ESTATE_BASE_URL");
    Ok(cmd)
}

#[test]
fn config_subcommand_reports_success_for_valid_config() -> Result<()> {
    let estate_home = TempDir::new()?;
    fs::write(
        estate_home.path().join("config.toml"),
        "base_url = \"https://estate.example/api\"\n",
    )?;

    let mut cmd = estate_command(estate_home.path())?;
    cmd.arg("config")
        .assert()
        .success()
        .stdout(contains("Current estate settings"))
        .stdout(contains("base_url: https://estate.example/api"));

    Ok(())
}

#[test]
fn config_subcommand_exits_with_code_three_on_validation_error() -> Result<()> {
    let estate_home = TempDir::new()?;
    fs::write(
        estate_home.path().join("config.toml"),
        "request_timeout_ms = \"soon\"\n",
    )?;

    let mut cmd = estate_command(estate_home.path())?;
    let output = cmd.arg("config").output()?;

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Config validation error"));

    Ok(())
}

#[test]
fn cli_override_and_env_are_reflected() -> Result<()> {
    let estate_home = TempDir::new()?;

    let mut cmd = estate_command(estate_home.path())?;
    cmd.env("ESTATE_BASE_URL", "http://env.example/api")
        .args(["config", "-c", "coalesce_renewals=false"])
        .assert()
        .success()
        .stdout(contains("base_url: http://env.example/api"))
        .stdout(contains("coalesce_renewals: false"));

    Ok(())
}

#[test]
fn malformed_override_is_rejected() -> Result<()> {
    let estate_home = TempDir::new()?;

    let mut cmd = estate_command(estate_home.path())?;
    cmd.args(["config", "-c", "base_url"])
        .assert()
        .failure()
        .stderr(contains("missing '='"));

    Ok(())
}
