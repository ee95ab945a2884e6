//! Configuration management for streamcat
//!
//! Handles config file loading/saving.
//! Config is stored at ~/.config/streamcat/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
///
/// The model layer holds an injected handle to this and reads `hide_anime`
/// at load time; there is no process-global flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Override for the catalog API base URL
    pub api_url: Option<String>,
    /// Filter out items carrying the anime genre from loads that honor it
    #[serde(default)]
    pub hide_anime: bool,
}

impl Config {
    /// Get config file path (~/.config/streamcat/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("streamcat").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }
}
