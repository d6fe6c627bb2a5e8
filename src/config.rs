//! Configuration types for the tray assistant.
//!
//! The config file is read-only input. Runtime state (clipboard history,
//! schedule) is never written back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NexusError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Clipboard watcher settings.
    pub clipboard: ClipboardConfig,
    /// Recurring system update settings.
    pub auto_update: AutoUpdateConfig,
    /// AI assistant provider settings.
    pub assistant: AssistantConfig,
    /// RAM status line settings.
    pub monitor: MonitorConfig,
}

/// Clipboard watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Whether the watcher starts with the application.
    pub enabled: bool,
    /// Delay between clipboard samples in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of entries kept in history.
    pub history_capacity: usize,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 500,
            history_capacity: crate::clipboard::history::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ClipboardConfig {
    /// Poll interval as a [`Duration`], never shorter than 50ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

/// Recurring update configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoUpdateConfig {
    /// Arm the daily update job at startup.
    pub enabled_at_start: bool,
    /// Delay used by the "update after a few seconds" action.
    pub delayed_update_secs: u64,
}

impl Default for AutoUpdateConfig {
    fn default() -> Self {
        Self {
            enabled_at_start: true,
            delayed_update_secs: 5,
        }
    }
}

/// System monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    /// Seconds between RAM samples.
    pub poll_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 5,
        }
    }
}

impl MonitorConfig {
    /// Poll interval as a [`Duration`], at least one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// AI assistant provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Model identifier appended to the endpoint.
    pub model: String,
    /// Environment variable holding the API key.
    ///
    /// The key itself is never stored in the config file.
    pub api_key_env: String,
    /// Fixed per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Resolve quick commands (`ram usage`, `search ...`) locally.
    pub local_commands: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::assistant::gemini::DEFAULT_ENDPOINT.to_owned(),
            model: crate::assistant::gemini::DEFAULT_MODEL.to_owned(),
            api_key_env: "GEMINI_API_KEY".to_owned(),
            request_timeout_secs: 10,
            local_commands: true,
        }
    }
}

impl AssistantConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Read the API key from the configured environment variable.
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty())
    }
}

impl NexusConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| NexusError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| NexusError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from [`default_config_path`](Self::default_config_path), or defaults
    /// when the file is absent or unreadable.
    pub fn load_or_default() -> Self {
        let path = Self::default_config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable config: {e}");
                Self::default()
            }
        }
    }

    /// Returns the default config file path: `~/.config/nexus/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::nexus_dirs::config_file()
    }
}
