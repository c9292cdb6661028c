//! TOML-based application configuration.
//!
//! Stores:
//! - Temperature thresholds for severity classification
//! - Alert cooldown windows
//! - Push notification settings (webhook URL, enabled flag)
//!
//! Configuration is stored at `~/.config/brewvat/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::alerts::{DEFAULT_PHYSICAL_COOLDOWN_SECS, DEFAULT_PUSH_COOLDOWN_SECS};
use crate::error::ConfigError;
use crate::severity::Thresholds;

use super::data_dir;

/// Alert cooldown configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_physical_cooldown")]
    pub physical_cooldown_secs: i64,
    #[serde(default = "default_push_cooldown")]
    pub push_cooldown_secs: i64,
}

fn default_physical_cooldown() -> i64 {
    DEFAULT_PHYSICAL_COOLDOWN_SECS
}

fn default_push_cooldown() -> i64 {
    DEFAULT_PUSH_COOLDOWN_SECS
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            physical_cooldown_secs: default_physical_cooldown(),
            push_cooldown_secs: default_push_cooldown(),
        }
    }
}

/// Push notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Webhook endpoint for critical-temperature pushes. Unset means the
    /// channel is unavailable and pushes are silently skipped.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/brewvat"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults if no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist the configuration.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}
