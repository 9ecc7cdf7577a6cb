use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

/// Settings chosen at build time. A JSON file in the user's config
/// directory may override individual fields.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub assistant_name: String,
    pub window_title: String,
    pub thinking_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            assistant_name: "DeskChat".to_string(),
            window_title: "💬 Local Chat Assistant".to_string(),
            thinking_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load from the default location, or built-in defaults if no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        if config.thinking_interval_ms == 0 {
            return Err(anyhow!("thinking_interval_ms must be greater than zero"));
        }
        Ok(config)
    }

    pub fn thinking_interval(&self) -> Duration {
        Duration::from_millis(self.thinking_interval_ms)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("deskchat").join("config.json"))
    }
}
