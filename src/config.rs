use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_session_path")]
    pub session_path: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Re-fetch everything after a successful write so counts stay derived.
    #[serde(default = "default_reload_after_write")]
    pub reload_after_write: bool,

    #[serde(default)]
    pub default_tags: Vec<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_session_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("markly")
        .join("session.toml")
        .to_string_lossy()
        .to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_reload_after_write() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_path: default_session_path(),
            request_timeout_secs: default_request_timeout(),
            reload_after_write: default_reload_after_write(),
            default_tags: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("api_base_url: {e}")))?;
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("markly")
            .join("config.toml")
    }
}
