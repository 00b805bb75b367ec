//! Application configuration
//!
//! One JSON file under the platform config directory. Missing files fall
//! back to defaults and are written out on first load, so a fresh install
//! starts with an editable config on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::infrastructure::analysis_client::AnalysisConfig;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::logging::LoggingConfig;

const CONFIG_DIR: &str = "shopscout";
const CONFIG_FILE: &str = "config.json";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outbound page fetching.
    #[serde(default)]
    pub fetch: HttpClientConfig,

    /// Inference endpoint settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Saved-products database location.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Saved-products database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("saved_products.db");
        Self {
            url: format!("sqlite:{}", path.display()),
        }
    }
}

/// Loads and saves the application configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory
    /// (`<config_dir>/shopscout/config.json`).
    ///
    /// # Errors
    /// Fails when the platform exposes no config directory.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("no platform config directory available")?
            .join(CONFIG_DIR);
        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
        })
    }

    /// Uses an explicit config file path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Reads the config file, or writes and returns defaults when it does
    /// not exist yet.
    pub async fn load_or_default(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            let config = AppConfig::default();
            self.save(&config).await?;
            info!(path = %self.config_path.display(), "wrote default configuration");
            return Ok(config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("failed to read {}", self.config_path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.config_path.display()))?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub async fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(config).context("failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("failed to write {}", self.config_path.display()))?;
        Ok(())
    }
}
