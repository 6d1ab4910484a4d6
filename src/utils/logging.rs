//! Structured logging and credential-safe log helpers.
//!
//! This module configures the `tracing` ecosystem for the application and
//! keeps the provider API key out of log sinks.

use crate::config::LoggingConfig;
use crate::error::{ProxyError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| ProxyError::Internal(format!("Failed to install logger: {}", e)))
}

/// Replaces every occurrence of `secret` in `input` with a placeholder.
///
/// Upstream error messages can echo request URLs or headers back; run them
/// through this before logging. Short secrets are ignored to avoid mangling
/// ordinary text.
pub fn sanitize(input: &str, secret: &str) -> String {
    if secret.len() < 8 {
        return input.to_string();
    }
    input.replace(secret, "[REDACTED_API_KEY]")
}
