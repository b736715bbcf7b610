use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::currency::flags::DEFAULT_FLAG_BASE_URL;
use crate::exchange::DEFAULT_API_BASE_URL;

/// Environment variables checked for the API key, in order
pub const API_KEY_ENV_VARS: &[&str] = &["FXCARD_API_KEY", "EXCHANGE_RATE_API_KEY"];

/// Optional palette overrides, hex strings like "#FFC107"
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rate API key (environment variables take precedence)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Rate API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Flag image host
    #[serde(default = "default_flag_base_url")]
    pub flag_base_url: String,

    /// Currency selected in the "from" box at startup
    #[serde(default = "default_from")]
    pub default_from: String,

    /// Currency selected in the "to" box at startup
    #[serde(default = "default_to")]
    pub default_to: String,

    /// Amount shown at startup
    #[serde(default = "default_amount")]
    pub default_amount: String,

    /// Per-request timeout for the rate API
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_flag_base_url() -> String {
    DEFAULT_FLAG_BASE_URL.to_string()
}

fn default_from() -> String {
    "USD".to_string()
}

fn default_to() -> String {
    "KES".to_string()
}

fn default_amount() -> String {
    "1".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            flag_base_url: default_flag_base_url(),
            default_from: default_from(),
            default_to: default_to(),
            default_amount: default_amount(),
            request_timeout_secs: default_timeout_secs(),
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("fxcard");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Ok(Self::load_from(&path)),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    /// Load config from `path`. A missing file is created with defaults; a file
    /// that can't be read or parsed is warned about and left untouched.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let config = AppConfig::default();
            if let Err(e) = config.save_to(path) {
                tracing::warn!("Could not write default config: {}", e);
            }
            return config;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config {}, using defaults: {}", path.display(), e);
                    AppConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config {}, using defaults: {}", path.display(), e);
                AppConfig::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut clean_config = self.clone();
        if clean_config.api_key.as_ref().map(|k| k.trim().is_empty()).unwrap_or(false) {
            clean_config.api_key = None;
        }

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// API key from the environment, falling back to the config file
    pub fn resolve_api_key(&self) -> Option<String> {
        Self::api_key_from(|name| std::env::var(name).ok()).or_else(|| {
            self.api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
        })
    }

    fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|k| !k.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            api_key: Some("abc123".to_string()),
            default_from: "EUR".to_string(),
            theme: ThemeConfig {
                accent: Some("#FFC107".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.api_key.as_deref(), Some("abc123"));
        assert_eq!(deserialized.default_from, "EUR");
        assert_eq!(deserialized.default_to, "KES");
        assert_eq!(deserialized.theme, config.theme);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("default_to = \"GBP\"\n").unwrap();

        assert_eq!(config.default_to, "GBP");
        assert_eq!(config.default_from, "USD");
        assert_eq!(config.default_amount, "1");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from(&path);

        assert_eq!(config.default_from, "USD");
        let written: AppConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.default_to, "KES");
    }

    #[test]
    fn test_unparsable_file_is_left_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let broken = "api_key = \"keep-me\"\ndefault_from = [oops\n";
        std::fs::write(&path, broken).unwrap();

        let config = AppConfig::load_from(&path);

        assert_eq!(config.default_from, "USD");
        assert_eq!(config.api_key, None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_save_drops_blank_api_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = AppConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).api_key, None);
    }

    #[test]
    fn test_api_key_env_order() {
        let key = AppConfig::api_key_from(|name| match name {
            "FXCARD_API_KEY" => Some(" ".to_string()),
            "EXCHANGE_RATE_API_KEY" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("from-env"));

        assert_eq!(AppConfig::api_key_from(|_| None), None);
    }
}
