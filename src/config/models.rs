//! Configuration data structures for sermon-assist.
//!
//! This module defines the schema for the application settings: the HTTP
//! server, the upstream Gemini connection, logging, and the offline asset
//! cache.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, limits).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Gemini API settings, including the credential.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Offline asset cache settings.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8888`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body in bytes.
    /// Default: `1 MiB`
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Whether to gzip responses.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

/// Settings for the upstream Gemini API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL of the public Gemini API.
    /// Default: `https://generativelanguage.googleapis.com/v1beta`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Model every generation request is sent to.
    /// Default: `gemini-2.5-flash`
    #[serde(default = "default_model")]
    pub model: String,

    /// Provider credential. Absent means every generation request fails
    /// with a configuration error rather than crashing the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Settings for the offline asset cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Prefix of every cache store name.
    /// Default: `sermon-assistant-cache`
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag. Bumping it evicts the previous generation on activation.
    /// Default: `v1`
    #[serde(default = "default_cache_version")]
    pub version: String,

    /// Origin that relative manifest entries are resolved against.
    /// Default: `http://127.0.0.1:8888/`
    #[serde(default = "default_origin")]
    pub origin: String,

    /// URLs fetched and stored at install time. Empty means the built-in list.
    #[serde(default)]
    pub manifest: Vec<String>,

    /// Directory holding the on-disk cache stores.
    /// Default: `~/.sermon-assist/caches`
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

/// Provider API key, wiped from memory on drop and never printed.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

// Custom Debug impl that never logs the key
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            enable_compression: true,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            cache_prefix: default_cache_prefix(),
            version: default_cache_version(),
            origin: default_origin(),
            manifest: Vec::new(),
            storage_dir: default_storage_dir(),
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_cache_prefix() -> String {
    "sermon-assistant-cache".to_string()
}

fn default_cache_version() -> String {
    "v1".to_string()
}

fn default_origin() -> String {
    "http://127.0.0.1:8888/".to_string()
}

fn default_storage_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".sermon-assist")
        .join("caches")
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("AIzaSecretValue");
        let printed = format!("{:?}", key);
        assert!(!printed.contains("AIzaSecretValue"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn test_defaults_match_original_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.assets.cache_prefix, "sermon-assistant-cache");
        assert_eq!(config.assets.version, "v1");
    }

    #[test]
    fn test_blank_api_key_counts_as_empty() {
        assert!(ApiKey::new("   ").is_empty());
        assert!(!ApiKey::new("k").is_empty());
    }
}
