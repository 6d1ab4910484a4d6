// Request validation, schema normalization and provider invocation

use super::provider::GenerationProvider;
use crate::config::GeminiConfig;
use crate::error::{ProxyError, Result};
use crate::models::{GenerateReply, GenerationRequest, ProviderRequest};
use crate::utils::logging::sanitize;
use axum::http::Method;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Stateless proxy core. Cloning shares the provider.
#[derive(Clone)]
pub struct ProxyService {
    config: Arc<GeminiConfig>,
    provider: Arc<dyn GenerationProvider>,
}

impl ProxyService {
    pub fn new(config: GeminiConfig, provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Handle one generation call.
    ///
    /// Checks run in order: method, body JSON, prompt, credential. Only a
    /// request that passes all four reaches the provider, exactly once.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> Result<GenerateReply> {
        if *method != Method::POST {
            debug!("Rejecting {} request", method);
            return Err(ProxyError::MethodNotAllowed);
        }

        let request: GenerationRequest = serde_json::from_slice(body).map_err(|e| {
            error!("Failed to deserialize request: {}", e);
            ProxyError::Json(e)
        })?;

        let prompt = request.prompt().ok_or(ProxyError::PromptRequired)?.to_string();

        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(ProxyError::MissingCredential)?;

        let provider_request = ProviderRequest {
            model: self.config.model.clone(),
            contents: prompt,
            config: request.config.map(|c| c.normalize()),
        };

        let schema = provider_request
            .config
            .as_ref()
            .and_then(|c| c.response_schema.as_ref())
            .map_or("none", |s| s.kind().as_str());
        info!(
            "Forwarding generation request: model={}, prompt_chars={}, schema={}",
            provider_request.model,
            provider_request.contents.chars().count(),
            schema
        );

        match self.provider.generate(api_key, provider_request).await {
            Ok(text) => Ok(GenerateReply { text }),
            Err(e) => {
                error!(
                    "Error in generation proxy: {}",
                    sanitize(&e.to_string(), api_key.expose())
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::models::{SchemaType, TypeName};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records every forwarded request and answers with a fixed result.
    struct RecordingProvider {
        calls: Mutex<Vec<ProviderRequest>>,
        fail_with: Option<String>,
    }

    impl RecordingProvider {
        fn ok() -> Arc<Self> {
            Arc::new(Self { calls: Mutex::new(Vec::new()), fail_with: None })
        }

        fn failing(msg: &str) -> Arc<Self> {
            Arc::new(Self { calls: Mutex::new(Vec::new()), fail_with: Some(msg.to_string()) })
        }
    }

    #[async_trait]
    impl GenerationProvider for RecordingProvider {
        async fn generate(&self, _api_key: &ApiKey, request: ProviderRequest) -> Result<String> {
            self.calls.lock().push(request);
            match &self.fail_with {
                Some(msg) => Err(ProxyError::GeminiApi(msg.clone())),
                None => Ok("generated".to_string()),
            }
        }
    }

    fn service(provider: Arc<RecordingProvider>, key: Option<&str>) -> ProxyService {
        let config = GeminiConfig {
            api_key: key.map(ApiKey::new),
            ..GeminiConfig::default()
        };
        ProxyService::new(config, provider)
    }

    #[tokio::test]
    async fn test_non_post_methods_never_reach_provider() {
        let provider = RecordingProvider::ok();
        let svc = service(provider.clone(), Some("key"));
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH, Method::OPTIONS, Method::HEAD] {
            let err = svc.handle(&method, br#"{"prompt":"hi"}"#).await.unwrap_err();
            assert!(matches!(err, ProxyError::MethodNotAllowed));
        }
        assert!(provider.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_empty_prompt_is_bad_request() {
        let provider = RecordingProvider::ok();
        let svc = service(provider.clone(), Some("key"));
        let bodies: [&[u8]; 4] = [br#"{}"#, br#"{"prompt":""}"#, br#"{"prompt":null}"#, br#"{"config":{}}"#];
        for body in bodies {
            let err = svc.handle(&Method::POST, body).await.unwrap_err();
            assert!(matches!(err, ProxyError::PromptRequired));
        }
        assert!(provider.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_is_server_error() {
        let provider = RecordingProvider::ok();
        let svc = service(provider.clone(), None);
        let err = svc.handle(&Method::POST, br#"{"prompt":"hi"}"#).await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingCredential));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(provider.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_server_error() {
        let provider = RecordingProvider::ok();
        let svc = service(provider.clone(), Some("key"));
        let err = svc.handle(&Method::POST, b"{not json").await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(provider.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_only_forwards_contents_without_config() {
        let provider = RecordingProvider::ok();
        let svc = service(provider.clone(), Some("key"));
        let reply = svc.handle(&Method::POST, br#"{"prompt":"hello"}"#).await.unwrap();
        assert_eq!(reply.text, "generated");

        let calls = provider.calls.lock();
        assert_eq!(calls.len(), 1);
        let forwarded = serde_json::to_value(&calls[0]).unwrap();
        assert_eq!(forwarded["contents"], "hello");
        assert!(forwarded.get("config").is_none());
    }

    #[tokio::test]
    async fn test_schema_types_normalized_before_forwarding() {
        let provider = RecordingProvider::ok();
        let svc = service(provider.clone(), Some("key"));
        let body = json!({
            "prompt": "extract",
            "config": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": { "name": { "type": "STRING" } }
                }
            }
        });
        svc.handle(&Method::POST, body.to_string().as_bytes()).await.unwrap();

        let calls = provider.calls.lock();
        assert_eq!(calls.len(), 1);
        let config = calls[0].config.as_ref().unwrap();
        let schema = config.response_schema.as_ref().unwrap();
        assert_eq!(schema.type_name, Some(TypeName::Known(SchemaType::Object)));
        let name = &schema.properties.as_ref().unwrap()["name"];
        assert_eq!(name.type_name, Some(TypeName::Known(SchemaType::String)));
        assert_eq!(config.extra["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_once() {
        let provider = RecordingProvider::failing("quota exhausted");
        let svc = service(provider.clone(), Some("key"));
        let err = svc.handle(&Method::POST, br#"{"prompt":"hi"}"#).await.unwrap_err();
        assert_eq!(err.public_message(), "quota exhausted");
        assert_eq!(provider.calls.lock().len(), 1);
    }
}
