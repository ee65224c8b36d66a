//! Configuration module for Orasible
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/orasible/orasible.toml)
//! - User configuration (~/.orasible.toml)
//! - Project configuration (./orasible.toml)
//! - Environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::oracle::{DEFAULT_ORATAB, DEFAULT_PMON_PREFIX, DEFAULT_SQLPLUS};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Oracle tooling settings
    pub oracle: OracleConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Where to find the registry and client tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Path to the oratab registry
    pub oratab: PathBuf,

    /// Fixed ORACLE_BASE; discovered with `orabase` when unset
    pub oracle_base: Option<String>,

    /// Helper printing ORACLE_BASE for a home
    pub orabase_command: String,

    /// SQL*Plus executable
    pub sqlplus_command: String,

    /// Process name prefix of the PMON background process
    pub pmon_prefix: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            oratab: PathBuf::from(DEFAULT_ORATAB),
            oracle_base: None,
            orabase_command: "orabase".to_string(),
            sqlplus_command: DEFAULT_SQLPLUS.to_string(),
            pmon_prefix: DEFAULT_PMON_PREFIX.to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when neither -v nor RUST_LOG is given
    pub level: String,

    /// Output format: text or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest priority first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/orasible/orasible.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".orasible.toml"));
        }

        paths.push(PathBuf::from("orasible.toml"));

        if let Ok(env_config) = std::env::var("ORASIBLE_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; non-default values in `other` win
    fn merge(&self, other: Config) -> Config {
        let defaults = OracleConfig::default();
        let pick = |theirs: String, ours: &String, default: &String| {
            if &theirs != default {
                theirs
            } else {
                ours.clone()
            }
        };

        Config {
            oracle: OracleConfig {
                oratab: if other.oracle.oratab != defaults.oratab {
                    other.oracle.oratab
                } else {
                    self.oracle.oratab.clone()
                },
                oracle_base: other
                    .oracle
                    .oracle_base
                    .or_else(|| self.oracle.oracle_base.clone()),
                orabase_command: pick(
                    other.oracle.orabase_command,
                    &self.oracle.orabase_command,
                    &defaults.orabase_command,
                ),
                sqlplus_command: pick(
                    other.oracle.sqlplus_command,
                    &self.oracle.sqlplus_command,
                    &defaults.sqlplus_command,
                ),
                pmon_prefix: pick(
                    other.oracle.pmon_prefix,
                    &self.oracle.pmon_prefix,
                    &defaults.pmon_prefix,
                ),
            },
            logging: LoggingConfig {
                level: pick(
                    other.logging.level,
                    &self.logging.level,
                    &LoggingConfig::default().level,
                ),
                format: pick(
                    other.logging.format,
                    &self.logging.format,
                    &LoggingConfig::default().format,
                ),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("ORASIBLE_ORATAB") {
            self.oracle.oratab = PathBuf::from(path);
        }

        if let Ok(base) = std::env::var("ORASIBLE_ORACLE_BASE") {
            self.oracle.oracle_base = Some(base);
        }

        if let Ok(sqlplus) = std::env::var("ORASIBLE_SQLPLUS") {
            self.oracle.sqlplus_command = sqlplus;
        }

        if let Ok(level) = std::env::var("ORASIBLE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Load from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}
