//! Service configuration resolved from environment variables.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `STUDYNOTE_DB_PATH` | SQLite file, or `:memory:` for the in-memory store | `<temp>/studynote.sqlite3` |
//! | `STUDYNOTE_LOG_LEVEL` | `trace`..`error` | build-mode default |
//! | `STUDYNOTE_LOG_DIR` | absolute log directory; logging is off when unset | unset |
//! | `STUDYNOTE_REQUEST_TIMEOUT_MS` | per-request client timeout, `0` = none | none |

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "STUDYNOTE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "STUDYNOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STUDYNOTE_LOG_DIR";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "STUDYNOTE_REQUEST_TIMEOUT_MS";

const MEMORY_DB_SENTINEL: &str = ":memory:";
const DEFAULT_DB_FILE: &str = "studynote.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub storage: StorageBackend,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but its value cannot be used.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Sqlite(std::env::temp_dir().join(DEFAULT_DB_FILE)),
            log_level: default_log_level(),
            log_dir: None,
            request_timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = read(ENV_DB_PATH) {
            config.storage = if value == MEMORY_DB_SENTINEL {
                StorageBackend::Memory
            } else {
                StorageBackend::Sqlite(PathBuf::from(value))
            };
        }

        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&value).map_err(|err| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value: value.clone(),
                reason: err.to_string(),
            })?;
        }

        if let Some(value) = read(ENV_LOG_DIR) {
            let path = PathBuf::from(&value);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value,
                    reason: "path must be absolute".to_string(),
                });
            }
            config.log_dir = Some(path);
        }

        if let Some(value) = read(ENV_REQUEST_TIMEOUT_MS) {
            let millis = value
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_REQUEST_TIMEOUT_MS,
                    value: value.clone(),
                    reason: err.to_string(),
                })?;
            config.request_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }

        Ok(config)
    }
}
