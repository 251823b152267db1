//! Environment-driven configuration.
//!
//! | Variable                  | Meaning                          | Default                              |
//! |---------------------------|----------------------------------|--------------------------------------|
//! | `PROJECTLEDGER_DB_PATH`   | SQLite database file             | `<temp_dir>/projectledger.sqlite3`   |
//! | `PROJECTLEDGER_LOG_LEVEL` | `trace|debug|info|warn|error`    | `debug` (debug builds), `info`       |
//! | `PROJECTLEDGER_LOG_DIR`   | absolute directory for log files | unset: file logging stays off        |
//!
//! Blank values count as unset.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "PROJECTLEDGER_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "PROJECTLEDGER_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PROJECTLEDGER_LOG_DIR";
pub const DEFAULT_DB_FILE_NAME: &str = "projectledger.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLogLevel(level) => write!(
                f,
                "unsupported log level `{level}` in {LOG_LEVEL_ENV}; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl LedgerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(raw) => {
                normalize_level(&raw).map_err(|_| ConfigError::UnsupportedLogLevel(raw))?
            }
            None => default_log_level(),
        };

        let log_dir = read(LOG_DIR_ENV).map(PathBuf::from);
        if let Some(dir) = log_dir.as_deref().filter(|dir| !dir.is_absolute()) {
            return Err(ConfigError::RelativeLogDir(dir.to_path_buf()));
        }

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    pub fn with_db_path(mut self, path: impl AsRef<Path>) -> Self {
        self.db_path = path.as_ref().to_path_buf();
        self
    }
}
