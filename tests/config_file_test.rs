// Integration test for startup configuration files

use daemon_guard::config::{ProbeKind, StartupConfig};
use daemon_guard::error::GuardError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.toml");

    let toml_content = r#"
        pid_file = "/var/run/burrow.pid"
        output_file = "/var/log/burrow/burrow.out"
        logging_config = "/etc/burrow/logging.toml"
        probe = "signal"

        [retry]
        max_attempts = 5
        abort_on_remove_failure = true
    "#;

    fs::write(&config_path, toml_content).unwrap();

    let config = StartupConfig::from_file(&config_path).unwrap();
    assert_eq!(config.pid_file, PathBuf::from("/var/run/burrow.pid"));
    assert_eq!(
        config.output_file,
        Some(PathBuf::from("/var/log/burrow/burrow.out"))
    );
    assert_eq!(config.logging_config, PathBuf::from("/etc/burrow/logging.toml"));
    assert_eq!(config.probe, ProbeKind::Signal);
    assert_eq!(config.retry.max_attempts, 5);
    assert!(config.retry.abort_on_remove_failure);
}

#[test]
fn test_load_toml_config_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.toml");

    fs::write(
        &config_path,
        r#"
        pid_file = "/var/run/burrow.pid"
        logging_config = "/etc/burrow/logging.toml"
        "#,
    )
    .unwrap();

    let config = StartupConfig::from_file(&config_path).unwrap();
    assert!(config.output_file.is_none());
    assert_eq!(config.proc_root, PathBuf::from("/proc"));
    assert_eq!(config.retry.max_attempts, 3);
    assert!(!config.retry.abort_on_remove_failure);
    assert_eq!(config.probe, ProbeKind::default());
}

#[test]
fn test_load_json_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.json");

    let json_content = r#"{
        "pid_file": "/var/run/burrow.pid",
        "logging_config": "/etc/burrow/logging.json",
        "probe": "procfs",
        "proc_root": "/host/proc",
        "retry": { "max_attempts": 2 }
    }"#;

    fs::write(&config_path, json_content).unwrap();

    let config = StartupConfig::from_file(&config_path).unwrap();
    assert_eq!(config.probe, ProbeKind::Procfs);
    assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
    assert_eq!(config.retry.max_attempts, 2);
}

#[test]
fn test_env_vars_expanded_in_paths() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.toml");
    std::env::set_var("GUARD_CONFIG_TEST_DIR", "/srv/burrow");

    fs::write(
        &config_path,
        r#"
        pid_file = "${GUARD_CONFIG_TEST_DIR}/burrow.pid"
        output_file = "$GUARD_CONFIG_TEST_DIR/burrow.out"
        logging_config = "/etc/burrow/logging.toml"
        "#,
    )
    .unwrap();

    let config = StartupConfig::from_file(&config_path).unwrap();
    assert_eq!(config.pid_file, PathBuf::from("/srv/burrow/burrow.pid"));
    assert_eq!(
        config.output_file,
        Some(PathBuf::from("/srv/burrow/burrow.out"))
    );
}

#[test]
fn test_invalid_retry_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.toml");

    fs::write(
        &config_path,
        r#"
        pid_file = "/var/run/burrow.pid"
        logging_config = "/etc/burrow/logging.toml"

        [retry]
        max_attempts = 0
        "#,
    )
    .unwrap();

    let result = StartupConfig::from_file(&config_path);
    assert!(matches!(result, Err(GuardError::ConfigValidation(_))));
}

#[test]
fn test_unknown_probe_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.toml");

    fs::write(
        &config_path,
        r#"
        pid_file = "/var/run/burrow.pid"
        logging_config = "/etc/burrow/logging.toml"
        probe = "psutil"
        "#,
    )
    .unwrap();

    let result = StartupConfig::from_file(&config_path);
    assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
}

#[test]
fn test_missing_required_field() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.toml");

    fs::write(&config_path, r#"pid_file = "/var/run/burrow.pid""#).unwrap();

    assert!(StartupConfig::from_file(&config_path).is_err());
}

#[test]
fn test_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("guard.yaml");

    fs::write(&config_path, "pid_file: /var/run/burrow.pid").unwrap();

    let result = StartupConfig::from_file(&config_path);
    assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
}

#[test]
fn test_missing_config_file() {
    let result = StartupConfig::from_file(&PathBuf::from("/nonexistent/guard.toml"));
    assert!(matches!(result, Err(GuardError::Config(_))));
}
