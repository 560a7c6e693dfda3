use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicJarConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8325".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Where the ledger document lives; defaults to tic_jar.json in the
    /// config directory
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default = "default_cost_per_tic")]
    pub cost_per_tic: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            cost_per_tic: default_cost_per_tic(),
        }
    }
}

fn default_cost_per_tic() -> f64 {
    0.5
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ticjar")
}

impl TicJarConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `ticjar init` first.",
                path.display()
            )
        })?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        Ok(config)
    }

    /// Resolved path of the ledger document
    pub fn data_file(&self) -> PathBuf {
        self.ledger
            .data_file
            .clone()
            .unwrap_or_else(|| config_dir().join("tic_jar.json"))
    }
}
