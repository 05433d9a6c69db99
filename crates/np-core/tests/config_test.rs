use std::fs;

use np_core::config::{Config, ConfigError};

#[test]
fn test_load_from_file_overrides_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[api]
base_url = "http://localhost:8080"
verify_tls = true

[openvpn]
status_files = ["openvpn-status.log"]

[metrics]
interface = "ens3"
accounting_dump = "/var/lib/vnstat/dump.txt"
"#,
    )
    .unwrap();

    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg.api.base_url, "http://localhost:8080");
    assert!(cfg.api.verify_tls);
    // Untouched fields keep their defaults.
    assert_eq!(cfg.api.attempts, 3);
    assert_eq!(cfg.openvpn.status_files.len(), 1);
    assert_eq!(cfg.openvpn.process_name, "openvpn");
    assert_eq!(cfg.metrics.interface, "ens3");
    assert!(cfg.metrics.accounting_dump.is_some());
}

#[test]
fn test_load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = Config::from_toml("[api\nbase_url = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_validation_rejects_bad_values() {
    let err = Config::from_toml("[api]\nattempts = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let err = Config::from_toml("[openvpn]\nstatus_files = []\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let err = Config::from_toml("[checks]\ntmpfs_max_percent = 101\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let err = Config::from_toml("[openvpn]\nhook_pattern = \"client-[\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_identity_is_read_and_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("keyfile.txt");
    let name = dir.path().join("servername.txt");
    fs::write(&key, "  abc123\n\n").unwrap();
    fs::write(&name, "vpn4\n").unwrap();

    let mut cfg = Config::default();
    cfg.identity.secret_file = key;
    cfg.identity.node_name_file = name;

    let identity = cfg.identity.load().unwrap();
    assert_eq!(identity.secret, "abc123");
    assert_eq!(identity.name, "vpn4");
}

#[test]
fn test_identity_missing_or_empty_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("keyfile.txt");
    let name = dir.path().join("servername.txt");
    fs::write(&key, "abc123").unwrap();

    let mut cfg = Config::default();
    cfg.identity.secret_file = key;
    cfg.identity.node_name_file = name.clone();
    assert!(matches!(cfg.identity.load(), Err(ConfigError::Io(_))));

    fs::write(&name, "   \n").unwrap();
    assert!(matches!(
        cfg.identity.load(),
        Err(ConfigError::Validation(_))
    ));
}
