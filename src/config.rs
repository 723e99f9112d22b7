use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::client::{DEFAULT_MODEL, GEMINI_ENDPOINT};
use crate::ai::DEFAULT_WINDOW;
use crate::chart::{RenderOptions, TimeRange};
use crate::patient::{DEFAULT_PATIENT_AGE, DEFAULT_PATIENT_NAME};

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONFIG_FILE: &str = "config.json";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,

    // AI service
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub request_timeout_secs: u64,
    pub ai_window: usize,

    // Dashboard
    pub default_time_range: TimeRange,
    pub chart_width: usize,
    pub chart_height: usize,
    pub patient_name: String,
    pub patient_age: u32,
    pub medical_history: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_endpoint: GEMINI_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            ai_window: DEFAULT_WINDOW,
            default_time_range: TimeRange::Day,
            chart_width: 60,
            chart_height: 12,
            patient_name: DEFAULT_PATIENT_NAME.to_string(),
            patient_age: DEFAULT_PATIENT_AGE,
            medical_history: String::new(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load from the default location
    pub fn load_or_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Save config to file, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to get home directory")?;
        Ok(home.join(".vitals-dashboard"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join(CONFIG_FILE))
    }

    /// API key from the environment, falling back to the stored one
    pub fn api_key(&self) -> Option<String> {
        Self::resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.gemini_api_key.as_deref())
    }

    fn resolve_api_key(env: Option<String>, stored: Option<&str>) -> Option<String> {
        env.filter(|k| !k.trim().is_empty())
            .or_else(|| stored.map(str::to_string))
            .filter(|k| !k.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.chart_width,
            height: self.chart_height,
            ..RenderOptions::default()
        }
    }
}
