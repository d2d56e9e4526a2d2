use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::adapter::AdapterKind;
use crate::planner::CyclePolicy;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TabulaConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub reset: ResetOptions,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database the CLI operates on.
    pub db_path: String,
}

/// Options controlling what a reset touches and how.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ResetOptions {
    /// Tables never enumerated nor emptied: `name` or `schema.name`.
    pub tables_to_ignore: Vec<String>,
    /// When non-empty, only these schemas are scanned.
    pub schemas_to_include: Vec<String>,
    /// Schemas never scanned.
    pub schemas_to_exclude: Vec<String>,
    /// Timeout for executing the delete script. `None` keeps the driver default.
    #[serde(rename = "command_timeout_secs", deserialize_with = "seconds")]
    pub command_timeout: Option<Duration>,
    pub adapter: AdapterKind,
    pub cycle_policy: CyclePolicy,
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs: Option<u64> = Option::deserialize(deserializer)?;
    Ok(secs.map(Duration::from_secs))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "test.db".into(),
        }
    }
}

/// Returns the default config file path: `./tabula.toml`
pub fn default_config_path() -> PathBuf {
    PathBuf::from("tabula.toml")
}

impl TabulaConfig {
    /// Load config from `TABULA_CONFIG` or `./tabula.toml` (if it exists),
    /// then apply env var overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("TABULA_CONFIG")
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(path)
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TabulaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (TABULA_DB, TABULA_LOG_LEVEL, TABULA_IGNORE).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TABULA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("TABULA_LOG_LEVEL") {
            self.logging.log_level = val;
        }
        if let Ok(val) = std::env::var("TABULA_IGNORE") {
            self.reset.tables_to_ignore = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
