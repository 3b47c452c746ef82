use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assistant::AssistantConfig;
use serde::{Deserialize, Serialize};
use session::SessionConfig;
use timeline::TimelineConfig;

pub const OLLAMA_URL_ENV: &str = "VELOCITY_OLLAMA_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timeline: TimelineConfig,
    pub session: SessionConfig,
    pub assistant: AssistantConfig,
}

pub fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
    base.join("velocity").join("config.json")
}

/// Reads `explicit` if given, else the default file when it exists, else defaults.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => read(path)?,
        None => {
            let path = default_config_path();
            if path.exists() { read(&path)? } else { AppConfig::default() }
        }
    };
    apply_env(&mut config, std::env::var(OLLAMA_URL_ENV).ok());
    Ok(config)
}

fn read(path: &Path) -> Result<AppConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn apply_env(config: &mut AppConfig, ollama_url: Option<String>) {
    if let Some(url) = ollama_url.filter(|u| !u.trim().is_empty()) {
        config.assistant.base_url = url;
    }
}
