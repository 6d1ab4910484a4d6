// Configuration module

mod models;

pub use models::*;

use crate::error::{ProxyError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

/// Plain environment variable the original deployment read the key from.
pub const API_KEY_ENV: &str = "API_KEY";

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file
    /// 3. Defaults (lowest)
    ///
    /// The credential is resolved here, once, so request handlers never touch
    /// the process environment.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::with_name(&Self::default_config_path()).required(false))
            // Override with environment variables (prefix: SERMON_ASSIST__)
            .add_source(
                Environment::with_prefix("SERMON_ASSIST")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("assets.manifest")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        app.resolve_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(app)
    }

    /// Fill in the credential from the legacy `API_KEY` variable when the
    /// layered sources did not provide one. Blank keys count as absent.
    pub fn resolve_api_key(&mut self, fallback: Option<String>) {
        if self.gemini.api_key.as_ref().is_some_and(|k| !k.is_empty()) {
            return;
        }
        self.gemini.api_key = fallback
            .map(ApiKey::new)
            .filter(|k| !k.is_empty());
    }

    /// Name of the cache store for the configured version tag.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.assets.cache_prefix, self.assets.version)
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sermon-assist")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_key_fills_missing_credential() {
        let mut config = AppConfig::default();
        config.resolve_api_key(Some("from-env".to_string()));
        assert_eq!(config.gemini.api_key.as_ref().map(|k| k.expose()), Some("from-env"));
    }

    #[test]
    fn test_configured_key_wins_over_fallback() {
        let mut config = AppConfig::default();
        config.gemini.api_key = Some(ApiKey::new("configured"));
        config.resolve_api_key(Some("from-env".to_string()));
        assert_eq!(config.gemini.api_key.as_ref().map(|k| k.expose()), Some("configured"));
    }

    #[test]
    fn test_blank_fallback_leaves_key_absent() {
        let mut config = AppConfig::default();
        config.resolve_api_key(Some("".to_string()));
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_cache_name_uses_version_tag() {
        let mut config = AppConfig::default();
        assert_eq!(config.cache_name(), "sermon-assistant-cache-v1");
        config.assets.version = "v2".to_string();
        assert_eq!(config.cache_name(), "sermon-assistant-cache-v2");
    }
}
