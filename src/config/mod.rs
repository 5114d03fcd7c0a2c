use serde::{Deserialize, Deserializer};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Custom deserializer for comma-separated strings
fn deserialize_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(split_comma_separated(&s))
}

fn split_comma_separated(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_LOG_FORMAT: &str = "json";
const DEFAULT_MAX_CONCURRENT_SCANS: u32 = 5;
const DEFAULT_JOB_RETENTION_LIMIT: u32 = 0;
const DEFAULT_SHUTDOWN_GRACE_SECONDS: f64 = 5.0;

/// Application settings with environment variable support
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Server
    pub host: String,
    pub port: u16,

    // Security
    #[serde(deserialize_with = "deserialize_comma_separated")]
    pub cors_allow_origins: Vec<String>,

    // Logging
    pub log_level: String,
    pub log_format: String,

    // Scan execution
    pub max_concurrent_scans: u32,
    /// Number of jobs kept in memory before finished ones are evicted, 0 keeps everything.
    pub job_retention_limit: u32,
    pub shutdown_grace_seconds: f64,
}

impl Settings {
    /// Create new settings instance from environment variables and .env file
    pub fn new() -> Result<Self, ConfigError> {
        Self::new_with_env_file(true)
    }

    /// Create new settings instance with optional .env file loading
    pub fn new_with_env_file(load_env_file: bool) -> Result<Self, ConfigError> {
        // Tests mutate the process environment; serialize reads of it
        static SETTINGS_BUILD_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let build_mutex = SETTINGS_BUILD_MUTEX.get_or_init(|| Mutex::new(()));
        let _guard = build_mutex
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut builder = config::Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("cors_allow_origins", DEFAULT_CORS_ORIGINS)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default("log_format", DEFAULT_LOG_FORMAT)?
            .set_default("max_concurrent_scans", DEFAULT_MAX_CONCURRENT_SCANS)?
            .set_default("job_retention_limit", DEFAULT_JOB_RETENTION_LIMIT)?
            .set_default("shutdown_grace_seconds", DEFAULT_SHUTDOWN_GRACE_SECONDS)?;

        // .env values land in the process environment and flow through the overrides below
        if load_env_file {
            dotenvy::dotenv().ok();
        }

        fn read_env(key: &str) -> Option<String> {
            std::env::var(key).ok()
        }

        // String overrides
        if let Some(v) = read_env("HOST") { builder = builder.set_override("host", v)?; }
        if let Some(v) = read_env("CORS_ALLOW_ORIGINS") { builder = builder.set_override("cors_allow_origins", v)?; }
        if let Some(v) = read_env("LOG_LEVEL") { builder = builder.set_override("log_level", v)?; }
        if let Some(v) = read_env("LOG_FORMAT") { builder = builder.set_override("log_format", v)?; }

        // Numeric overrides
        if let Some(v) = read_env("PORT").and_then(|s| s.parse::<u16>().ok()) { builder = builder.set_override("port", i64::from(v))?; }
        if let Some(v) = read_env("MAX_CONCURRENT_SCANS").and_then(|s| s.parse::<u32>().ok()) { builder = builder.set_override("max_concurrent_scans", v)?; }
        if let Some(v) = read_env("JOB_RETENTION_LIMIT").and_then(|s| s.parse::<u32>().ok()) { builder = builder.set_override("job_retention_limit", v)?; }
        if let Some(v) = read_env("SHUTDOWN_GRACE_SECONDS").and_then(|s| s.parse::<f64>().ok()) { builder = builder.set_override("shutdown_grace_seconds", v)?; }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "plain") {
            return Err(ConfigError::Validation(
                "log_format must be 'json' or 'plain'".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::Validation(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_scans == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent_scans must be greater than 0".to_string(),
            ));
        }

        if !self.shutdown_grace_seconds.is_finite() || self.shutdown_grace_seconds <= 0.0 {
            return Err(ConfigError::Validation(
                "shutdown_grace_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Built-in defaults, without consulting the environment
impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allow_origins: split_comma_separated(DEFAULT_CORS_ORIGINS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            max_concurrent_scans: DEFAULT_MAX_CONCURRENT_SCANS,
            job_retention_limit: DEFAULT_JOB_RETENTION_LIMIT,
            shutdown_grace_seconds: DEFAULT_SHUTDOWN_GRACE_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests;
