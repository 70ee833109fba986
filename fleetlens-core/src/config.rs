//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/fleetlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/fleetlens/` (~/.config/fleetlens/)
//! - State/Logs: `$XDG_STATE_HOME/fleetlens/` (~/.local/state/fleetlens/)

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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Agent runtime path overrides
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Refresh (polling) configuration
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Cost estimation pricing
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Skill detection configuration
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the agent runtime keeps its per-agent directories.
#[derive(Debug, Deserialize, Default)]
pub struct AgentsConfig {
    /// Override path for the agents directory tree
    pub root: Option<PathBuf>,
}

/// Snapshot refresh configuration.
#[derive(Debug, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between full recomputation passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

/// USD-per-million-token rates used for the fleet cost estimate.
///
/// These are rough defaults, not a pricing authority. Adjust them to
/// whatever the fleet's dominant model actually bills.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PricingConfig {
    /// USD per million input tokens
    #[serde(default = "default_input_per_mtok")]
    pub input_per_mtok: f64,

    /// USD per million output tokens
    #[serde(default = "default_output_per_mtok")]
    pub output_per_mtok: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_mtok: default_input_per_mtok(),
            output_per_mtok: default_output_per_mtok(),
        }
    }
}

fn default_input_per_mtok() -> f64 {
    3.0
}

fn default_output_per_mtok() -> f64 {
    15.0
}

/// Skill-usage detection configuration.
///
/// Skill usage is inferred from file-read tool calls whose path argument
/// crosses a `/skills/` directory. If the upstream runtime renames its
/// file-read tool, set it here; detection degrades to zero otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsConfig {
    /// Name of the runtime's file-read tool (compared case-insensitively)
    #[serde(default = "default_file_read_tool")]
    pub file_read_tool: String,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            file_read_tool: default_file_read_tool(),
        }
    }
}

fn default_file_read_tool() -> String {
    "read".to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
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
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the agents directory tree to aggregate.
    ///
    /// Defaults to `~/.fleetlens/agents` unless overridden in config.
    pub fn agents_root(&self) -> PathBuf {
        self.agents
            .root
            .clone()
            .unwrap_or_else(|| home_dir().join(".fleetlens").join("agents"))
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/fleetlens/config.toml` (~/.config/fleetlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("fleetlens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/fleetlens/` (~/.local/state/fleetlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("fleetlens")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("fleetlens.log")
    }
}
