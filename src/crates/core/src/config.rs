//! Application configuration
//!
//! Resolution order: built-in defaults, then the TOML file (`ONETHING_CONFIG`
//! or `<config dir>/onething/config.toml`), then environment overrides.

use crate::util::errors::{OneThingError, OneThingResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ONETHING_CONFIG";
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const BIND_ADDR_ENV: &str = "ONETHING_BIND_ADDR";
pub const DATA_FILE_ENV: &str = "ONETHING_DATA_FILE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub anthropic_version: String,
    /// Maximum silence between two upstream stream events.
    pub idle_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: None,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 500,
            anthropic_version: "2023-06-01".to_string(),
            idle_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot location. `None` keeps everything in memory.
    pub data_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> OneThingResult<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> OneThingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OneThingError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loading config: path={}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> OneThingResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn config_path() -> Option<PathBuf> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => dirs::config_dir().map(|dir| dir.join("onething").join("config.toml")),
        }
    }

    /// Default data file under the platform data dir.
    pub fn default_data_file() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("onething").join("tasks.json"))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.ai.api_key = Some(key);
        }
        if let Some(addr) = lookup(BIND_ADDR_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind_addr = addr;
        }
        if let Some(file) = lookup(DATA_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            self.storage.data_file = Some(PathBuf::from(file));
        }
        if self.ai.api_key.is_none() {
            warn!("{} is not set; briefing requests will fail", API_KEY_ENV);
        }
    }
}
