//! Configuration file support.
//!
//! Configuration is loaded from `<config dir>/bearmode/config.toml` unless a
//! path is given on the command line. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const APP_DIR: &str = "bearmode";
const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "bearmode.db";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Insert the default body categories into an empty catalog at startup.
    #[serde(default = "default_seed_categories")]
    pub default_categories: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_categories: default_seed_categories(),
        }
    }
}

fn default_db_path() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR).join(DB_FILE)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_seed_categories() -> bool {
    true
}

impl Config {
    /// Loads from `path` when given, otherwise from the default location.
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(AppError::Config("database.path cannot be empty".to_string()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(AppError::Config("logging.level cannot be empty".to_string()));
        }
        Ok(())
    }
}
