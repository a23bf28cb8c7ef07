//! Runtime configuration for the academy core.
//!
//! # Responsibility
//! - Describe the database target, logging setup and listing page limits.
//! - Load overrides from `ACADEMY_*` environment variables.
//!
//! # Invariants
//! - Blank variables fall back to defaults; malformed values are errors.
//! - A validated config has `0 < page_size_default <= page_size_max`.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::repo::query::{PageLimits, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "ACADEMY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ACADEMY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ACADEMY_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "ACADEMY_PAGE_SIZE";
pub const ENV_PAGE_SIZE_MAX: &str = "ACADEMY_PAGE_SIZE_MAX";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file; in-memory database when unset.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub page_size_default: u32,
    pub page_size_max: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_size_default: DEFAULT_PAGE_SIZE,
            page_size_max: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { var: &'static str, value: String },
    ZeroPageSize,
    PageSizeAboveMax { default: u32, max: u32 },
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { var, value } => {
                write!(f, "{var} must be a positive integer, got `{value}`")
            }
            Self::ZeroPageSize => write!(f, "page sizes must be greater than zero"),
            Self::PageSizeAboveMax { default, max } => write!(
                f,
                "default page size {default} exceeds maximum page size {max}"
            ),
            Self::RelativeLogDir(dir) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                dir.display()
            ),
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Defaults overridden by `ACADEMY_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = read(ENV_PAGE_SIZE) {
            config.page_size_default = parse_page_size(ENV_PAGE_SIZE, value)?;
        }
        if let Some(value) = read(ENV_PAGE_SIZE_MAX) {
            config.page_size_max = parse_page_size(ENV_PAGE_SIZE_MAX, value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size_default == 0 || self.page_size_max == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.page_size_default > self.page_size_max {
            return Err(ConfigError::PageSizeAboveMax {
                default: self.page_size_default,
                max: self.page_size_max,
            });
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(())
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_size: self.page_size_default,
            max_size: self.page_size_max,
        }
    }

    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Starts file logging when a log directory is configured. Returns
    /// whether logging is active afterwards.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(&self.log_level, &dir.to_string_lossy())?;
        Ok(true)
    }
}

fn parse_page_size(var: &'static str, value: String) -> Result<u32, ConfigError> {
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber { var, value })
}
