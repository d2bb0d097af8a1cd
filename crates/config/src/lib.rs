//! Configuration management for Stepwise
//!
//! Handles loading and saving agent settings from the user's home directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir, memory_path, prompts_path, workspace_path};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    4096
}

/// Agent run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
    #[serde(default = "default_max_thought_steps")]
    pub max_thought_steps: usize,
    #[serde(default = "default_memory_token_budget")]
    pub memory_token_budget: usize,
    /// Per-step model call deadline in seconds; 0 disables the deadline.
    #[serde(default)]
    pub step_timeout_secs: u64,
    #[serde(default = "default_long_term_memory")]
    pub long_term_memory: bool,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            prompts_dir: default_prompts_dir(),
            max_thought_steps: default_max_thought_steps(),
            memory_token_budget: default_memory_token_budget(),
            step_timeout_secs: 0,
            long_term_memory: default_long_term_memory(),
        }
    }
}

fn default_work_dir() -> String {
    "~/.stepwise/work".to_string()
}

fn default_prompts_dir() -> String {
    "./prompts".to_string()
}

fn default_max_thought_steps() -> usize {
    10
}

fn default_memory_token_budget() -> usize {
    4000
}

fn default_long_term_memory() -> bool {
    true
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentDefaults,
}

impl Config {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("saving config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Work directory with `~` expanded
    pub fn work_dir(&self) -> PathBuf {
        expand_home(&self.agent.work_dir)
    }

    /// Prompt template directory with `~` expanded
    pub fn prompts_dir(&self) -> PathBuf {
        expand_home(&self.agent.prompts_dir)
    }

    /// Per-step model deadline, if one is configured
    pub fn step_timeout(&self) -> Option<std::time::Duration> {
        if self.agent.step_timeout_secs == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(self.agent.step_timeout_secs))
        }
    }

    /// Whether an API key has been configured
    pub fn has_api_key(&self) -> bool {
        !self.provider.api_key.is_empty()
    }
}

/// Expand a leading `~` or `~/` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Initialize config file and workspace directories
pub async fn init() -> Result<Config> {
    let config = match Config::load().await {
        Ok(c) => c,
        Err(_) => Config::default(),
    };

    let path = config_path();
    if !path.exists() {
        config.save_to(&path).await?;
        info!("created config at {:?}", path);
    }

    paths::ensure_dir(&config.work_dir()).await?;
    paths::ensure_dir(&data_dir()).await?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_plain_path() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home("./prompts"), PathBuf::from("./prompts"));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/work"), home.join("work"));
        }
    }

    #[test]
    fn test_step_timeout_disabled_by_default() {
        let config = Config::default();
        assert!(config.step_timeout().is_none());
    }

    #[test]
    fn test_step_timeout_from_seconds() {
        let mut config = Config::default();
        config.agent.step_timeout_secs = 30;
        assert_eq!(
            config.step_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }
}
