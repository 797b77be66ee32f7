//! Configuration management for Parley
//!
//! Handles loading and saving the conversation limits and turn settings.
//! Provider credentials belong to the caller that builds the provider client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::WindowLimits;
use crate::error::{Error, Result};
use crate::orchestration::{SystemPrompt, TurnOptions, DEFAULT_MAX_TOOL_ITERATIONS};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Conversation history window
    pub history: HistoryConfig,
    /// Turn execution settings
    pub turn: TurnConfig,
}

/// History window settings; zero disables a limit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_history_messages: usize,
    pub max_history_tokens: usize,
}

impl HistoryConfig {
    pub fn limits(&self) -> WindowLimits {
        WindowLimits::new(self.max_history_messages, self.max_history_tokens)
    }
}

/// Turn execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Tool rounds allowed per turn
    pub max_tool_iterations: usize,
    /// Upper bound on a whole turn, tool execution included
    pub turn_timeout_secs: u64,
    /// Bound on each background persistence write
    pub persist_timeout_secs: u64,
    /// Replaces the default tool-use instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            turn_timeout_secs: 300,
            persist_timeout_secs: 5,
            system_prompt: None,
        }
    }
}

impl TurnConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_secs(self.persist_timeout_secs)
    }

    /// Orchestrator options derived from this section
    pub fn options(&self) -> TurnOptions {
        let system_prompt = match &self.system_prompt {
            Some(base) if !base.trim().is_empty() => SystemPrompt::with_base(base.clone()),
            _ => SystemPrompt::default(),
        };
        TurnOptions {
            max_tool_iterations: self.max_tool_iterations,
            system_prompt,
        }
    }
}

/// Configuration manager for loading and saving config
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a config manager with a specific path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self { config_path, config })
    }

    /// Get the default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("parley").join("config.toml"))
    }

    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&self.config_path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}
