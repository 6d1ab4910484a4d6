// Error types for the sermon-assist proxy and asset cache

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Message returned to callers when no upstream detail is available.
pub const GENERIC_FAILURE: &str = "Failed to generate AI content";

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Prompt is required")]
    PromptRequired,

    #[error("API key not configured on server")]
    MissingCredential,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    #[error("Asset cache error: {0}")]
    Cache(String),

    #[error("Lifecycle violation: {0}")]
    Lifecycle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status this error maps to at the proxy boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PromptRequired | ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `error` field of the response body.
    ///
    /// Upstream failures pass the provider's message through; anything without
    /// a useful message collapses to [`GENERIC_FAILURE`].
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::PromptRequired | ProxyError::MissingCredential => self.to_string(),
            ProxyError::GeminiApi(msg) if !msg.trim().is_empty() => msg.clone(),
            ProxyError::Json(e) => e.to_string(),
            ProxyError::Http(e) => e.to_string(),
            ProxyError::InvalidRequest(msg) => msg.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

// Convert ProxyError to HTTP responses for Axum
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 405 is plain text, everything else is a JSON error body
        if let ProxyError::MethodNotAllowed = self {
            return (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.to_string(),
            )
                .into_response();
        }

        let body = json!({ "error": self.public_message() });
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
