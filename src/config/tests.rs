use crate::config::{ConfigError, Settings};
use std::env;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const ALL_CONFIG_VARS: &[&str] = &[
    "HOST",
    "PORT",
    "CORS_ALLOW_ORIGINS",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "MAX_CONCURRENT_SCANS",
    "JOB_RETENTION_LIMIT",
    "SHUTDOWN_GRACE_SECONDS",
];

/// Helper to set environment variables for testing
fn with_env_vars<F, R>(vars: Vec<(&str, &str)>, test: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let original_values: Vec<_> = ALL_CONFIG_VARS
        .iter()
        .map(|key| (*key, env::var(key).ok()))
        .collect();

    for key in ALL_CONFIG_VARS {
        env::remove_var(key);
    }
    for (key, value) in &vars {
        env::set_var(key, value);
    }

    let result = test();

    for (key, original_value) in original_values {
        match original_value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    result
}

#[test]
fn test_default_settings() {
    let settings = with_env_vars(vec![], || Settings::new_with_env_file(false))
        .expect("Failed to create default settings");

    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.port, 8000);
    assert_eq!(
        settings.cors_allow_origins,
        vec!["http://localhost:3000", "http://127.0.0.1:3000"]
    );
    assert_eq!(settings.log_level, "INFO");
    assert_eq!(settings.log_format, "json");
    assert_eq!(settings.max_concurrent_scans, 5);
    assert_eq!(settings.job_retention_limit, 0);
    assert_eq!(settings.shutdown_grace_seconds, 5.0);
}

#[test]
fn test_builder_defaults_match_default_impl() {
    let built = with_env_vars(vec![], || Settings::new_with_env_file(false))
        .expect("Failed to create settings");
    let default = Settings::default();

    assert_eq!(built.host, default.host);
    assert_eq!(built.port, default.port);
    assert_eq!(built.cors_allow_origins, default.cors_allow_origins);
    assert_eq!(built.max_concurrent_scans, default.max_concurrent_scans);
    assert_eq!(built.job_retention_limit, default.job_retention_limit);
}

#[test]
fn test_environment_variable_override() {
    let settings = with_env_vars(
        vec![
            ("HOST", "127.0.0.1"),
            ("PORT", "9090"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "plain"),
            ("MAX_CONCURRENT_SCANS", "12"),
            ("JOB_RETENTION_LIMIT", "250"),
            ("SHUTDOWN_GRACE_SECONDS", "1.5"),
        ],
        || Settings::new_with_env_file(false),
    )
    .expect("Failed to create settings");

    assert_eq!(settings.bind_address(), "127.0.0.1:9090");
    assert_eq!(settings.log_level, "DEBUG");
    assert_eq!(settings.log_format, "plain");
    assert_eq!(settings.max_concurrent_scans, 12);
    assert_eq!(settings.job_retention_limit, 250);
    assert_eq!(settings.shutdown_grace_seconds, 1.5);
}

#[test]
fn test_comma_separated_with_spaces() {
    let settings = with_env_vars(
        vec![(
            "CORS_ALLOW_ORIGINS",
            " http://localhost:3000 , https://dashboard.novacore.test ,",
        )],
        || Settings::new_with_env_file(false),
    )
    .expect("Failed to create settings");

    assert_eq!(
        settings.cors_allow_origins,
        vec!["http://localhost:3000", "https://dashboard.novacore.test"]
    );
}

#[test]
fn test_unparseable_numeric_override_is_ignored() {
    let settings = with_env_vars(vec![("MAX_CONCURRENT_SCANS", "lots")], || {
        Settings::new_with_env_file(false)
    })
    .expect("Failed to create settings");

    assert_eq!(settings.max_concurrent_scans, 5);
}

#[test]
fn test_invalid_log_format() {
    let result = with_env_vars(vec![("LOG_FORMAT", "xml")], || {
        Settings::new_with_env_file(false)
    });

    match result {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("log_format")),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_zero_concurrency_rejected() {
    let result = with_env_vars(vec![("MAX_CONCURRENT_SCANS", "0")], || {
        Settings::new_with_env_file(false)
    });

    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_validate_shutdown_grace() {
    let settings = Settings {
        shutdown_grace_seconds: 0.0,
        ..Settings::default()
    };
    assert!(settings.validate().is_err());
    assert!(Settings::default().validate().is_ok());
}

#[test]
fn test_dotenv_file_values_flow_through_overrides() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp_file, "MAX_CONCURRENT_SCANS=7").expect("Failed to write to temp file");
    writeln!(temp_file, "LOG_LEVEL=WARN").expect("Failed to write to temp file");

    let settings = with_env_vars(vec![], || {
        dotenvy::from_path(temp_file.path()).expect("Failed to load env file");
        Settings::new_with_env_file(false)
    })
    .expect("Failed to create settings");

    assert_eq!(settings.max_concurrent_scans, 7);
    assert_eq!(settings.log_level, "WARN");
}
