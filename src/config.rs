//! Configuration loading for pwv
//!
//! Configuration is loaded from a TOML file, with defaults that need only a
//! vault URL and a username to be useful. Command-line flags override
//! anything set here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::approval::AllowList;
use crate::VaultError;

/// Reason sent with confirmations when none is configured
pub const DEFAULT_REASON: &str = "Automatically accepted! You're welcome.";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault connection configuration
    pub vault: VaultConfig,
    /// Approval configuration
    pub approval: ApprovalConfig,
}

/// Vault connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Base URL of the password vault, e.g. `https://pwv.example.com`
    pub base_url: Option<String>,
    /// Username to log in with
    pub username: Option<String>,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

/// Approval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Requestors whose requests are confirmed automatically
    pub allowed_users: Vec<String>,
    /// Reason sent with each confirmation
    pub reason: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            accept_invalid_certs: false,
            timeout_secs: 30,
        }
    }
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            allowed_users: Vec::new(),
            reason: DEFAULT_REASON.to_string(),
        }
    }
}

impl VaultConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self, VaultError> {
        let config_path = match path.cloned().or_else(Self::default_path) {
            Some(path) => path,
            None => {
                tracing::info!("no config directory available, using defaults");
                return Ok(Config::default());
            }
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .map_err(|e| VaultError::Config(format!("failed to read config: {e}")))?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| VaultError::Config(format!("failed to parse config: {e}")))?;
            tracing::debug!(path = %config_path.display(), "loaded configuration");
            Ok(config)
        } else if path.is_some() {
            Err(VaultError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )))
        } else {
            tracing::info!("no config file found at {}, using defaults", config_path.display());
            Ok(Config::default())
        }
    }

    /// `<config_dir>/pwv/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pwv").join("config.toml"))
    }

    /// Allow-list built from the configured users
    pub fn allow_list(&self) -> AllowList {
        self.approval.allowed_users.iter().collect()
    }
}
