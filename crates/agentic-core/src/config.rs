//! Configuration management for agentic
//!
//! Two documents are involved:
//! - the tool server configuration, a JSON file with an `mcpServers` map
//!   naming the subprocesses to launch
//! - optional agent settings in TOML (model, credentials, loop limits)

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod defaults {
    pub const MODEL: &str = "claude-sonnet-4-20250514";
    pub const MAX_TOKENS: u32 = 4096;
    pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
    pub const MAX_ITERATIONS: usize = 30;
    pub const TERMINATION_TOKEN: &str = "TASK_COMPLETE";
    pub const WEB_SEARCH_MAX_USES: u32 = 5;
}

/// Launch configuration for one tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Executable to spawn
    pub command: String,
    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables, added to the inherited environment
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpServerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// The `mcpServers` document. Servers are kept sorted by name so connection
/// order, and with it tool-name precedence, is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServersConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
}

impl ServersConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read server config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse server config: {}", e)))
    }
}

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key (takes precedence over `api_key_env`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Model to use
    pub model: String,
    /// Base URL for the API (optional, for proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Max tokens per model response
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: defaults::API_KEY_ENV.to_string(),
            model: defaults::MODEL.to_string(),
            base_url: None,
            max_tokens: defaults::MAX_TOKENS,
        }
    }
}

impl ProviderConfig {
    /// Get the API key, checking the environment if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

/// Turn loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model calls per query
    pub max_iterations: usize,
    /// Literal the model emits when it is done
    pub termination_token: String,
    /// Offer the provider-side web search tool
    pub web_search: bool,
    pub web_search_max_uses: u32,
    /// Replaces the built-in directive when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: defaults::MAX_ITERATIONS,
            termination_token: defaults::TERMINATION_TOKEN.to_string(),
            web_search: false,
            web_search_max_uses: defaults::WEB_SEARCH_MAX_USES,
            system_prompt: None,
        }
    }
}

/// Agent settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl Settings {
    /// Default settings location: `<config_dir>/agentic/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("agentic").join("config.toml"))
    }

    /// Load settings. An explicit path must exist; the default path is
    /// optional and falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read settings {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings {}: {}", path.display(), e)))
    }
}
