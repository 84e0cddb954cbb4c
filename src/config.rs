/// Runtime configuration for the WAP report service.
///
/// All settings come from environment variables, with a `.env` file in the
/// working directory honored when present. Every variable has a default
/// except `DATABASE_URL`, whose absence simply disables persistence.

use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::noaa::FetchSettings;
use crate::logging::LogLevel;
use crate::model::WapError;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub registry_path: PathBuf,
    pub report_dir: PathBuf,
    pub log_file: Option<String>,
    pub log_level: LogLevel,
    pub fetch: FetchSettings,
    /// How long to wait for every river worker before reporting without it.
    pub thread_timeout: Duration,
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("rivers.toml"),
            report_dir: PathBuf::from("reports"),
            log_file: None,
            log_level: LogLevel::Info,
            fetch: FetchSettings::default(),
            thread_timeout: Duration::from_secs(60),
            database_url: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, WapError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();

        let log_level = match get("WAP_LOG_LEVEL") {
            Some(name) => LogLevel::from_name(&name)
                .ok_or_else(|| WapError::Config(format!("WAP_LOG_LEVEL: unknown level '{}'", name)))?,
            None => defaults.log_level,
        };

        let timeout_secs = parse_number("WAP_FETCH_TIMEOUT_SECS", get("WAP_FETCH_TIMEOUT_SECS"), 10)?;
        let max_retries = parse_number("WAP_MAX_RETRIES", get("WAP_MAX_RETRIES"), 3)?;
        let thread_timeout_secs = parse_number("WAP_THREAD_TIMEOUT_SECS", get("WAP_THREAD_TIMEOUT_SECS"), 60)?;

        if timeout_secs == 0 {
            return Err(WapError::Config("WAP_FETCH_TIMEOUT_SECS must be positive".to_string()));
        }

        Ok(Self {
            registry_path: get("WAP_REGISTRY").map(PathBuf::from).unwrap_or(defaults.registry_path),
            report_dir: get("WAP_REPORT_DIR").map(PathBuf::from).unwrap_or(defaults.report_dir),
            log_file: get("WAP_LOG_FILE"),
            log_level,
            fetch: FetchSettings {
                timeout: Duration::from_secs(timeout_secs),
                max_retries: u32::try_from(max_retries).map_err(|_| {
                    WapError::Config(format!("WAP_MAX_RETRIES: {} is too large", max_retries))
                })?,
            },
            thread_timeout: Duration::from_secs(thread_timeout_secs),
            database_url: get("DATABASE_URL"),
        })
    }
}

fn parse_number(key: &str, raw: Option<String>, default: u64) -> Result<u64, WapError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| WapError::Config(format!("{}: '{}' is not a whole number", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, WapError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).expect("defaults are valid");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.registry_path, PathBuf::from("rivers.toml"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("WAP_REGISTRY", "/etc/wap/rivers.toml"),
            ("WAP_REPORT_DIR", "/var/lib/wap"),
            ("WAP_LOG_FILE", "wap.log"),
            ("WAP_LOG_LEVEL", "debug"),
            ("WAP_FETCH_TIMEOUT_SECS", "5"),
            ("WAP_MAX_RETRIES", "0"),
            ("WAP_THREAD_TIMEOUT_SECS", "120"),
            ("DATABASE_URL", "postgres://wap@localhost/wap"),
        ])
        .expect("valid overrides");

        assert_eq!(config.registry_path, PathBuf::from("/etc/wap/rivers.toml"));
        assert_eq!(config.report_dir, PathBuf::from("/var/lib/wap"));
        assert_eq!(config.log_file.as_deref(), Some("wap.log"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert_eq!(config.fetch.max_retries, 0);
        assert_eq!(config.thread_timeout, Duration::from_secs(120));
        assert_eq!(config.database_url.as_deref(), Some("postgres://wap@localhost/wap"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("WAP_REGISTRY", "  "), ("DATABASE_URL", "")]).expect("valid");
        assert_eq!(config.registry_path, PathBuf::from("rivers.toml"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        let err = config_from(&[("WAP_MAX_RETRIES", "three")]).expect_err("not a number");
        assert!(matches!(err, WapError::Config(_)));

        assert!(config_from(&[("WAP_THREAD_TIMEOUT_SECS", "-1")]).is_err());
        assert!(config_from(&[("WAP_FETCH_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(config_from(&[("WAP_LOG_LEVEL", "loud")]).is_err());
    }
}
