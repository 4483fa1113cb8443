//! Configuration file resolution and environment overrides
//!
//! Uses serial_test to prevent ENV variable race conditions: every test
//! that reads or writes PIXPAY_* variables is marked #[serial].

use pixpay_common::config::{
    resolve_config_path, AppConfig, CLIENT_SECRET_ENV_VAR, CONFIG_ENV_VAR, SHEET_TOKEN_ENV_VAR,
};
use pixpay_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG: &str = r#"
[bank]
base_url = "https://bank.example"
client_id = "client"
client_secret = "file-secret"
account = "435379291"

[sheet]
spreadsheet_id = "sheet-id"
sheet_name = "Pagamentos"
access_token = "file-token"
request_code_column = 8

[logging]
level = "debug"
"#;

fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("pixpay.toml");
    fs::write(&path, CONFIG).unwrap();
    path
}

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(CLIENT_SECRET_ENV_VAR);
    env::remove_var(SHEET_TOKEN_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml"))).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli.toml"));

    clear_env();
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/from-env.toml"));

    clear_env();
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "  ");

    // Falls through to the file lookups; whichever way it resolves it must
    // not be the blank value
    if let Ok(path) = resolve_config_path(None) {
        assert_ne!(path, PathBuf::from("  "));
    }

    clear_env();
}

#[test]
#[serial]
fn test_load_reads_every_section() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.bank.base_url, "https://bank.example");
    assert_eq!(config.bank.client_secret, "file-secret");
    assert_eq!(config.bank.account, "435379291");
    assert_eq!(config.sheet.sheet_name, "Pagamentos");
    assert_eq!(config.sheet.access_token, "file-token");
    assert_eq!(config.sheet.request_code_column, 8);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_env_overrides_secrets() {
    clear_env();
    env::set_var(CLIENT_SECRET_ENV_VAR, "env-secret");
    env::set_var(SHEET_TOKEN_ENV_VAR, "env-token");

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);
    let config = AppConfig::load(&path).unwrap();

    assert_eq!(config.bank.client_secret, "env-secret");
    assert_eq!(config.sheet.access_token, "env-token");

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let err = AppConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_invalid_toml_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[bank\nclient_id = ").unwrap();

    let err = AppConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("Parse TOML failed"));
}
