//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve database location and logging settings from the environment.
//! - Validate settings once, before any connection or logger is opened.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - `log_level` is always one of `trace|debug|info|warn|error`.
//! - `log_dir`, when set, is absolute.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "PAGETREE_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "PAGETREE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PAGETREE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "pagetree.sqlite3";

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Log level is not a supported value.
    InvalidLogLevel(String),
    /// Log directory is not absolute.
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_ENV}: {message}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file backing the document store.
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Rolling log directory; logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `PAGETREE_DB_PATH`, `PAGETREE_LOG_LEVEL` and `PAGETREE_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(db_path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        if let Some(log_dir) = read(LOG_DIR_ENV) {
            let log_dir = PathBuf::from(log_dir);
            if !log_dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(log_dir));
            }
            config.log_dir = Some(log_dir);
        }
        Ok(config)
    }

    /// Overrides the database path.
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.db_path.ends_with("pagetree.sqlite3"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_and_normalizes_values() {
        let log_dir = std::env::temp_dir().join("pagetree-logs");
        let log_dir_text = log_dir.to_string_lossy().to_string();
        let config = CoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /data/pages.db "),
            (LOG_LEVEL_ENV, "WARNING"),
            (LOG_DIR_ENV, log_dir_text.as_str()),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/pages.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(log_dir));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config =
            CoreConfig::from_lookup(lookup_from(&[(DB_PATH_ENV, "  "), (LOG_DIR_ENV, "")]))
                .unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn rejects_unknown_level_and_relative_log_dir() {
        let level_err =
            CoreConfig::from_lookup(lookup_from(&[(LOG_LEVEL_ENV, "loud")])).unwrap_err();
        assert!(matches!(level_err, ConfigError::InvalidLogLevel(_)));

        let dir_err =
            CoreConfig::from_lookup(lookup_from(&[(LOG_DIR_ENV, "logs")])).unwrap_err();
        assert_eq!(dir_err, ConfigError::RelativeLogDir(PathBuf::from("logs")));
    }
}
