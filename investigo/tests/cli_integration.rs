// investigo/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command isolated from the user's config files and data.json.
fn investigo(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("investigo").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("RUST_LOG")
        .env_remove("INVESTIGO_DB")
        .env_remove("INVESTIGO_CONFIG")
        .env_remove("INVESTIGO_CONCURRENCY")
        .env_remove("INVESTIGO_TOR")
        .env_remove("INVESTIGO_VERBOSE")
        .arg("--no-color");
    cmd
}

/// Helper to create a test catalog file
fn write_catalog(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("catalog.json");
    fs::write(&path, json).expect("Failed to write catalog");
    path
}

fn db_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn test_help_shows_flags() {
    let dir = TempDir::new().unwrap();
    let mut cmd = investigo(&dir);
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--tor"))
        .stdout(predicate::str::contains("--site"))
        .stdout(predicate::str::contains("--db"))
        .stdout(predicate::str::contains("--test"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_invalid_concurrency() {
    let dir = TempDir::new().unwrap();
    let mut cmd = investigo(&dir);
    cmd.args(["alice", "-c", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "Concurrency must be between 1 and 100",
        ));
}

#[test]
fn test_invalid_timeout() {
    let dir = TempDir::new().unwrap();
    let mut cmd = investigo(&dir);
    cmd.args(["alice", "--timeout", "whenever"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn test_invalid_handle() {
    let dir = TempDir::new().unwrap();
    let mut cmd = investigo(&dir);
    cmd.arg("alice/bob");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot contain '/'"));
}

#[test]
fn test_missing_explicit_catalog_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = investigo(&dir);
    cmd.args(["alice", "--db", "does-not-exist.json"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn test_unknown_site_filter_fails() {
    let dir = TempDir::new().unwrap();
    let db = write_catalog(&dir, "{}");
    let mut cmd = investigo(&dir);
    cmd.args(["alice", "--db", &db_arg(&db), "--site", "Nowhere"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No matching sites"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[defaults]\nconcurrency = 500\n").unwrap();

    let mut cmd = investigo(&dir);
    cmd.args(["alice", "--config", &config.to_string_lossy()]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_unreachable_site_reports_error() {
    let dir = TempDir::new().unwrap();
    let db = write_catalog(
        &dir,
        r#"{"Closed": {"errorType": "status_code", "url": "http://127.0.0.1:1/{}"}}"#,
    );

    let mut cmd = investigo(&dir);
    cmd.args(["alice", "--db", &db_arg(&db), "--site", "closed", "--timeout", "5s"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Investigating alice on:"))
        .stdout(predicate::str::contains("[!] Closed: ERROR:"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_unsupported_strategy_reports_error() {
    let dir = TempDir::new().unwrap();
    let db = write_catalog(
        &dir,
        r#"{"Fancy": {"errorType": "regex_check", "url": "https://fancy.invalid/{}"}}"#,
    );

    let mut cmd = investigo(&dir);
    cmd.args(["alice", "--db", &db_arg(&db), "--site", "Fancy"]);

    cmd.assert().success().stdout(predicate::str::contains(
        "[!] Fancy: ERROR: Unsupported error type `regex_check`",
    ));
}

#[test]
fn test_missing_default_catalog_warns() {
    let dir = TempDir::new().unwrap();
    let mut cmd = investigo(&dir);
    cmd.args(["--test", "--site", "NAVER"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("data.json not found"))
        .stdout(predicate::str::contains("0 of 0 sites incompatible"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_found_and_verbose_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alice"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db = write_catalog(
        &dir,
        &format!(
            r#"{{"Local": {{"errorType": "status_code", "url": "{}/{{}}"}}}}"#,
            server.uri()
        ),
    );

    let mut cmd = investigo(&dir);
    cmd.args(["alice", "bob", "--db", &db_arg(&db), "--site", "Local", "-v"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Investigating alice on:"))
        .stdout(predicate::str::contains(format!(
            "[+] Local: {}/alice",
            server.uri()
        )))
        .stdout(predicate::str::contains("Investigating bob on:"))
        .stdout(predicate::str::contains("[-] Local: Not Found!"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_hidden_without_verbose() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let db = write_catalog(
        &dir,
        &format!(
            r#"{{"Local": {{"errorType": "status_code", "url": "{}/{{}}"}}}}"#,
            server.uri()
        ),
    );

    let mut cmd = investigo(&dir);
    cmd.args(["bob", "--db", &db_arg(&db), "--site", "Local"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Not Found!").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handles_read_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carol"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db = write_catalog(
        &dir,
        &format!(
            r#"{{"Local": {{"errorType": "status_code", "url": "{}/{{}}"}}}}"#,
            server.uri()
        ),
    );

    let mut cmd = investigo(&dir);
    cmd.args(["--db", &db_arg(&db), "--site", "Local"])
        .write_stdin("carol\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Investigating carol on:"))
        .stdout(predicate::str::contains("[+] Local:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_catalog_self_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blue"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db = write_catalog(
        &dir,
        &format!(
            r#"{{
                "Good": {{"errorType": "status_code", "url": "{uri}/{{}}",
                          "username_claimed": "blue", "username_unclaimed": "nobody"}},
                "Bad": {{"errorType": "status_code", "url": "{uri}/{{}}",
                         "username_claimed": "red", "username_unclaimed": "nobody"}}
            }}"#,
            uri = server.uri()
        ),
    );

    let mut cmd = investigo(&dir);
    cmd.args(["--test", "--db", &db_arg(&db), "--site", "Good", "--site", "Bad"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[-] Bad: Failed"))
        .stdout(predicate::str::contains("Good").not())
        .stdout(predicate::str::contains("1 of 2 sites incompatible"));
}
