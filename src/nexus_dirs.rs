//! Application directory paths for nexus.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | Linux |
//! |---------|-------|
//! | App data (logs) | `~/.local/share/nexus/` |
//! | Config | `~/.config/nexus/` |
//!
//! # Environment Overrides
//!
//! - `NEXUS_DATA_DIR` overrides [`data_dir`]
//! - `NEXUS_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("NEXUS_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("nexus"))
        .unwrap_or_else(|| PathBuf::from("/tmp/nexus-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("NEXUS_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("nexus"))
        .unwrap_or_else(|| PathBuf::from("/tmp/nexus-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
