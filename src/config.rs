use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "API_KEY";
pub const MODEL_ENV: &str = "IMAGE_EFFECTS_MODEL";
pub const ENDPOINT_ENV: &str = "IMAGE_EFFECTS_ENDPOINT";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Default, Serialize, Deserialize)]
/// Persisted UI/application settings.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    pub browse_path: Option<PathBuf>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("image-effects").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "ignoring unreadable config");
            Self::default()
        })
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything the AI client needs, resolved once at startup.
pub struct ApiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Resolves the API settings from the process environment and `config`.
    pub fn from_env(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::resolve(
            config,
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(MODEL_ENV).ok(),
            std::env::var(ENDPOINT_ENV).ok(),
        )
    }

    fn resolve(
        config: &AppConfig,
        api_key: Option<String>,
        model_override: Option<String>,
        endpoint_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = non_blank(api_key).ok_or(ConfigError::MissingApiKey)?;
        let model = non_blank(model_override)
            .or_else(|| non_blank(config.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint = non_blank(endpoint_override)
            .or_else(|| non_blank(config.endpoint.clone()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = Duration::from_secs(
            config
                .request_timeout_secs
                .filter(|&secs| secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Ok(Self {
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
