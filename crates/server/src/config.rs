use serde::Deserialize;
use spendlens_classify::{SignalWeights, TransferDetector};
use spendlens_core::rules::RuleOverrides;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "SPENDLENS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "spendlens.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub lookup: LookupConfig,
    pub classifier: SignalWeights,
    pub transfers: TransferConfig,
    pub rules: RuleOverrides,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("spendlens.db"),
        }
    }
}

/// Web lookups are off unless asked for.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    pub ddg_timeout_secs: u64,
    pub wiki_timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 400,
            ddg_timeout_secs: 8,
            wiki_timeout_secs: 5,
        }
    }
}

impl LookupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub date_window_days: i64,
    pub amount_tolerance_cents: i64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        let d = TransferDetector::default();
        Self {
            date_window_days: d.date_window_days,
            amount_tolerance_cents: d.amount_tolerance_cents,
        }
    }
}

impl TransferConfig {
    pub fn detector(&self) -> TransferDetector {
        TransferDetector::new(self.date_window_days, self.amount_tolerance_cents)
    }
}

impl Config {
    /// Reads `$SPENDLENS_CONFIG`, else `spendlens.toml` in the working
    /// directory. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
