// Gemini API client

use crate::config::{ApiKey, GeminiConfig};
use crate::error::{ProxyError, Result};
use crate::models::gemini::{GenerateContentRequest, GenerateContentResponse};
use crate::models::ProviderRequest;
use crate::proxy::GenerationProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Client for the public Gemini REST API.
///
/// Sends exactly one `generateContent` call per request. The HTTP client has
/// neither a connect nor a request timeout: a hung upstream call is awaited.
pub struct GeminiClient {
    http_client: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client with a pooled HTTP connection.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created Gemini HTTP client for {}", config.api_base_url);

        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the API base_url
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Extract error message from API response JSON
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error = serde_json::from_str::<ErrorResponse>(response_text).ok()?.error?;
        error.message.or(error.status)
    }

    /// Call Gemini `generateContent` and return the answer text.
    pub async fn generate_content(
        &self,
        api_key: &ApiKey,
        request: &ProviderRequest,
    ) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = GenerateContentRequest::from_provider_request(request);

        debug!("Calling generateContent API for model: {}", request.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProxyError::GeminiApi(format!("HTTP error: {}", e.without_url())))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ProxyError::GeminiApi(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!("Gemini API error: HTTP {}", status);
            let message = Self::extract_error_message(&response_text)
                .unwrap_or_else(|| format!("HTTP {}: {}", status, response_text));
            return Err(ProxyError::GeminiApi(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            ProxyError::GeminiApi(format!("Response parsing error: {}", e))
        })?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Token usage: prompt={:?}, candidates={:?}, total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        parsed.text().ok_or_else(|| {
            let reason = parsed.block_reason().unwrap_or("no candidates returned");
            ProxyError::GeminiApi(format!("Prompt was not answered: {}", reason))
        })
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(&self, api_key: &ApiKey, request: ProviderRequest) -> Result<String> {
        self.generate_content(api_key, &request).await
    }
}
