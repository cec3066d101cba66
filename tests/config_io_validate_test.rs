use kia_uvo::config::{AccountConfig, Config};
use std::fs;

#[test]
fn loaded_file_keeps_all_sections() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        br"
accounts:
  - name: home
    username: me@example.com
    password: secret
polling:
  update_interval_minutes: 10
client:
  base_url: http://localhost:9999/api
  timeout_seconds: 5
logging:
  level: DEBUG
  console_output: false
",
    )
    .unwrap();

    let loaded = Config::from_file(tmp.path()).unwrap();
    assert!(loaded.validate().is_ok());
    assert_eq!(loaded.accounts[0].username, "me@example.com");
    assert_eq!(loaded.accounts[0].password, "secret");
    assert_eq!(loaded.polling.update_interval_minutes, 10);
    assert_eq!(loaded.client.base_url, "http://localhost:9999/api");
    assert_eq!(loaded.client.timeout_seconds, 5);
    assert!(!loaded.logging.console_output);
    assert!(loaded.web.enabled);
}

#[test]
fn multi_account_file() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        br"
accounts:
  - name: mine
    username: a@example.com
    password: one
  - name: partner
    username: b@example.com
    password: two
    read_only: true
polling:
  update_interval_minutes: 5
web:
  port: 9000
",
    )
    .unwrap();

    let cfg = Config::from_file(tmp.path()).unwrap();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.accounts.len(), 2);
    assert!(!cfg.accounts[0].read_only);
    assert!(cfg.accounts[1].read_only);
    assert_eq!(cfg.web.port, 9000);
    assert_eq!(cfg.web.host, "127.0.0.1");
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    cfg.accounts.push(AccountConfig::new("", "user", "pw"));
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.accounts.push(AccountConfig::new("a", " ", "pw"));
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.client.base_url.clear();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.web.port = 0;
    assert!(cfg.validate().is_err());
    cfg.web.enabled = false;
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"accounts: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("Serialization error"));
}

#[test]
fn from_missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("I/O error"));
}
