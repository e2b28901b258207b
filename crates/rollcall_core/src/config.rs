//! Application configuration.
//!
//! # Responsibility
//! - Load the JSON settings file (`Database` / `Logging` sections).
//! - Apply `ROLLCALL_*` environment overrides on top of file values.
//! - Reject pool bounds the pool builder cannot honor.
//!
//! # Invariants
//! - Every field has a default; an empty object is a valid config.
//! - Environment values win over file values; empty env values are ignored.

use crate::db::PoolConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Database path override.
pub const ENV_DB_PATH: &str = "ROLLCALL_DB_PATH";
/// Log level override (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "ROLLCALL_LOG_LEVEL";
/// Absolute log directory override.
pub const ENV_LOG_DIR: &str = "ROLLCALL_LOG_DIR";

/// Path value selecting a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DatabaseConfig {
    /// SQLite file path, or [`IN_MEMORY_PATH`].
    pub path: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "rollcall.db".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoggingConfig {
    /// `None` selects the build-mode default.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; stderr when unset.
    pub directory: Option<String>,
}

impl AppConfig {
    /// Reads `path`, then applies process environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, |key| std::env::var(key).ok())
    }

    /// Defaults plus process environment overrides, for runs without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses `raw` and applies overrides resolved through `env`.
    pub fn from_json(
        raw: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.apply_overrides(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = path;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = Some(level);
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.logging.directory = Some(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let pool = &self.database.pool;
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid("Database.Path cannot be empty".into()));
        }
        if pool.max_open == 0 {
            return Err(ConfigError::Invalid(
                "Database.Pool.MaxOpen must be greater than zero".into(),
            ));
        }
        if pool.min_idle > pool.max_open {
            return Err(ConfigError::Invalid(format!(
                "Database.Pool.MinIdle ({}) exceeds MaxOpen ({})",
                pool.min_idle, pool.max_open
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = AppConfig::from_json("{}", env_of(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database.path, "rollcall.db");
        assert_eq!(config.database.pool.max_open, 25);
        assert_eq!(config.database.pool.min_idle, 5);
        assert_eq!(config.database.pool.max_lifetime_secs, 300);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn file_values_are_read_with_pascal_case_keys() {
        let raw = r#"{
            "Database": { "Path": "/var/lib/rollcall.db", "Pool": { "MaxOpen": 8, "MinIdle": 2 } },
            "Logging": { "Level": "warn", "Directory": "/var/log/rollcall" }
        }"#;
        let config = AppConfig::from_json(raw, env_of(&[])).unwrap();
        assert_eq!(config.database.path, "/var/lib/rollcall.db");
        assert_eq!(config.database.pool.max_open, 8);
        assert_eq!(config.database.pool.min_idle, 2);
        assert_eq!(config.database.pool.acquire_timeout_ms, 30_000);
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.logging.directory.as_deref(), Some("/var/log/rollcall"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let raw = r#"{ "Database": { "Path": "file.db" }, "Logging": { "Level": "info" } }"#;
        let env = env_of(&[
            (ENV_DB_PATH, ":memory:"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_DIR, "/tmp/rollcall-logs"),
        ]);
        let config = AppConfig::from_json(raw, env).unwrap();
        assert!(config.database.is_in_memory());
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.directory.as_deref(), Some("/tmp/rollcall-logs"));
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let raw = r#"{ "Database": { "Path": "file.db" } }"#;
        let config = AppConfig::from_json(raw, env_of(&[(ENV_DB_PATH, "  ")])).unwrap();
        assert_eq!(config.database.path, "file.db");
    }

    #[test]
    fn invalid_pool_bounds_are_rejected() {
        let zero = r#"{ "Database": { "Pool": { "MaxOpen": 0, "MinIdle": 0 } } }"#;
        assert!(matches!(
            AppConfig::from_json(zero, env_of(&[])),
            Err(ConfigError::Invalid(_))
        ));

        let idle = r#"{ "Database": { "Pool": { "MaxOpen": 2, "MinIdle": 3 } } }"#;
        let err = AppConfig::from_json(idle, env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("MinIdle"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_json("{ not json", env_of(&[])),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appsettings.json");
        std::fs::write(&path, r#"{ "Logging": { "Level": "error" } }"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert!(config.logging.level.is_some());
    }
}
