use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "YOUTUBE_API_KEY",
    "GOOGLE_CLIENT_ID",
    "GOOGLE_CLIENT_SECRET",
    "TUBESEARCH_REGION",
    "TUBESEARCH_ACCESS_TOKEN",
    "RUST_LOG",
];

/// Command isolated from the caller's credentials and `.env`.
fn base_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tubesearch"));
    cmd.current_dir(dir.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_subcommands_and_exit_codes() {
    let tmp = TempDir::new().unwrap();
    base_cmd(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("search"))
        .stdout(contains("login"))
        .stdout(contains("Exit codes: 0 ok, 1 unexpected failure"));
}

#[test]
fn tui_refuses_without_terminal() {
    let tmp = TempDir::new().unwrap();
    // Test harness stdout is not a TTY.
    base_cmd(&tmp)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("requires a terminal"));
}

#[test]
fn search_without_credentials_is_config_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");
    base_cmd(&tmp)
        .args(["--config", missing.to_str().unwrap(), "search", "cats"])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("YOUTUBE_API_KEY"));
}

#[test]
fn malformed_config_file_is_config_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "api_key = \"k\"\nclient_id = \"c\"\nbogus_key = 1\n").unwrap();
    base_cmd(&tmp)
        .args(["--config", path.to_str().unwrap(), "search", "cats"])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("Failed to parse config file"));
}

#[test]
fn unknown_order_is_usage_error() {
    let tmp = TempDir::new().unwrap();
    base_cmd(&tmp)
        .args(["search", "cats", "--order", "loudest"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("loudest"));
}

#[test]
fn json_search_prints_nothing_on_config_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");
    // Parsing succeeds; the run then stops at configuration.
    base_cmd(&tmp)
        .args(["--config", missing.to_str().unwrap(), "search", "cats", "--json"])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty());
}
