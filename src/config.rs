//! Load runtime configuration. Every key is optional; missing ones fall back to defaults.

use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub const CONFIG_ENV: &str = "TRADE_LEDGER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LedgerCfg {
    pub equity_path: PathBuf,
    pub option_path: PathBuf,
}

impl Default for LedgerCfg {
    fn default() -> Self {
        let dir = data_dir();
        Self {
            equity_path: dir.join("table_data.json"),
            option_path: dir.join("option_data.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConsoleCfg {
    pub prompt: String,
}

impl Default for ConsoleCfg {
    fn default() -> Self {
        Self {
            prompt: "ledger> ".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub ledger: LedgerCfg,
    pub console: ConsoleCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        let cfg: Self = serde_yaml::from_str(&s)?;
        Ok(cfg)
    }

    /// `$TRADE_LEDGER_CONFIG` if set, else `config.yaml` in the working directory.
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

/// Per-user data dir, or the working directory when the platform has none.
fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "trade-ledger")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
