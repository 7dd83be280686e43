//! Configuration loading for the spisok binary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spisok_channels::NotifierKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings read from `~/.spisok/config.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reminder store file. A leading `~` is expanded.
    pub store_path: String,
    pub notifier: NotifierKind,
    /// Buffer size of the channel carrying matured jobs to the fire handler
    pub queue_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: "~/.spisok/reminders.json".to_string(),
            notifier: NotifierKind::default(),
            queue_buffer: 64,
        }
    }
}

impl Config {
    pub fn store_path(&self) -> PathBuf {
        expand_tilde(&self.store_path)
    }
}

/// `~/.spisok`, falling back to the current directory without a home.
pub fn spisok_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".spisok")
}

pub fn default_config_path() -> PathBuf {
    spisok_dir().join("config.toml")
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;

    if config.queue_buffer == 0 {
        anyhow::bail!("queue_buffer must be at least 1");
    }
    Ok(config)
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
