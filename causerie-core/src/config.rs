//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/causerie/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/causerie/` (~/.config/causerie/)
//! - Data: `$XDG_DATA_HOME/causerie/` (~/.local/share/causerie/)
//! - State/Logs: `$XDG_STATE_HOME/causerie/` (~/.local/state/causerie/)
//!
//! Secrets (agent API key, agent id) can also come from the environment:
//! `CAUSERIE_API_KEY` and `CAUSERIE_AGENT_ID` override the file. The data
//! directory holding transcripts and logs can be overridden with
//! `CAUSERIE_DATA_DIR`, which is what the tests use.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Upstream agent API configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data directory layout
    #[serde(default)]
    pub data: DataConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream conversational agent configuration.
///
/// The relay sends the full conversation history to the agent completions
/// endpoint on every turn, authenticated with a bearer API key.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// API key for the agent platform (or `CAUSERIE_API_KEY`)
    pub api_key: Option<String>,

    /// Agent identifier (or `CAUSERIE_AGENT_ID`)
    pub agent_id: Option<String>,

    /// Completions endpoint
    #[serde(default = "default_agent_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,

    /// Display name used for assistant lines in the chat log
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            agent_id: None,
            endpoint: default_agent_endpoint(),
            timeout_secs: default_agent_timeout(),
            bot_name: default_bot_name(),
        }
    }
}

fn default_agent_endpoint() -> String {
    "https://api.mistral.ai/v1/agents/completions".to_string()
}

fn default_agent_timeout() -> u64 {
    30
}

fn default_bot_name() -> String {
    "Absa".to_string()
}

impl AgentConfig {
    /// Validate that the relay can actually be used.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(Error::Config(
                "agent.api_key is required (or set CAUSERIE_API_KEY)".to_string(),
            ));
        }
        if self.agent_id.is_none() {
            return Err(Error::Config(
                "agent.agent_id is required (or set CAUSERIE_AGENT_ID)".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Data directory layout.
///
/// Everything the system persists lives under one directory: per-conversation
/// transcript files, the shared plain-text chat log, and the link event log.
#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Root data directory; defaults to the XDG data dir for causerie
    pub dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { dir: None }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist. Environment overrides are applied last.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {}", e)))?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("CAUSERIE_API_KEY") {
            self.agent.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("CAUSERIE_AGENT_ID") {
            self.agent.agent_id = Some(id);
        }
        if let Ok(dir) = std::env::var("CAUSERIE_DATA_DIR") {
            self.data.dir = Some(PathBuf::from(dir));
        }
    }

    /// Path to the config file
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("causerie").join("config.toml")
    }

    /// Root data directory (configured or XDG default)
    pub fn data_dir(&self) -> PathBuf {
        self.data
            .dir
            .clone()
            .unwrap_or_else(|| xdg_data_home().join("causerie"))
    }

    /// Directory holding per-conversation transcript files
    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir().join("conversations")
    }

    /// Path to the shared plain-text chat log
    pub fn chat_log_path(&self) -> PathBuf {
        self.conversations_dir().join("conversations-log.txt")
    }

    /// Path to the link event log
    pub fn event_log_path(&self) -> PathBuf {
        self.data_dir().join("logs").join("links_log.jsonl")
    }

    /// Path to the legacy whole-array link event log, still readable
    pub fn legacy_event_log_path(&self) -> PathBuf {
        self.data_dir().join("logs").join("links_log.json")
    }

    /// Directory for server log files
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("causerie")
    }
}
