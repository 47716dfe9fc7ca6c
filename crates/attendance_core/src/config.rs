//! Database connection settings.
//!
//! # Responsibility
//! - Describe where sessions connect and how long they wait on locks.
//! - Read overrides from process environment.
//!
//! # Invariants
//! - Credentials and pooling are out of scope; SQLite needs a path only.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the database file.
pub const DB_PATH_ENV: &str = "ATTENDANCE_DB_PATH";
/// Environment variable overriding the lock wait in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "ATTENDANCE_BUSY_TIMEOUT_MS";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage target for new sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Every session gets its own private database.
    Memory,
}

/// Settings consumed by `SqliteConnectionProvider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub location: DbLocation,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyPath(&'static str),
    InvalidNumber { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath(key) => write!(f, "`{key}` must not be empty"),
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` expects milliseconds, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl DbConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn memory() -> Self {
        Self {
            location: DbLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Builds a config from process environment.
    ///
    /// Returns `Ok(None)` when `ATTENDANCE_DB_PATH` is unset.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(path) = lookup(DB_PATH_ENV) else {
            return Ok(None);
        };
        let path = path.trim();
        if path.is_empty() {
            return Err(ConfigError::EmptyPath(DB_PATH_ENV));
        }

        let mut config = Self::file(path);
        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: BUSY_TIMEOUT_ENV,
                    value: raw.clone(),
                })?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        Ok(Some(config))
    }

    /// Short label for log lines; never includes the path.
    pub(crate) fn mode(&self) -> &'static str {
        match self.location {
            DbLocation::File(_) => "file",
            DbLocation::Memory => "memory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DbConfig, DbLocation, BUSY_TIMEOUT_ENV, DB_PATH_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn unset_path_yields_none() {
        assert_eq!(DbConfig::from_lookup(lookup(&[])).unwrap(), None);
    }

    #[test]
    fn path_and_timeout_are_read() {
        let config = DbConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /tmp/school.db "),
            (BUSY_TIMEOUT_ENV, "250"),
        ]))
        .unwrap()
        .expect("path is set");
        assert_eq!(
            config.location,
            DbLocation::File(PathBuf::from("/tmp/school.db"))
        );
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = DbConfig::from_lookup(lookup(&[(DB_PATH_ENV, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyPath(DB_PATH_ENV));

        let err = DbConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "school.db"),
            (BUSY_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
