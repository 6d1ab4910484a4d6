//! Caller side of the generation proxy.
//!
//! `ProxyClient` posts prompts to a running proxy and shapes the answers the
//! way the assistant uses them: plain suggestions appended to a field, and the
//! bilingual passage parsed out of a JSON reply.

pub mod prompts;

use crate::error::{ProxyError, Result};
use crate::models::GenerationResponse;
use crate::server::GENERATE_PATH;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

pub use prompts::{field_analysis_prompt, field_prompt, passage_prompt, SermonField};

/// Heading placed above every appended suggestion.
pub const SUGGESTION_HEADING: &str = "Sugerencia AI:";

const RVR1960_MISSING: &str = "No se pudo encontrar la versión RVR1960.";
const NTV_MISSING: &str = "No se pudo encontrar la versión NTV.";
const RVR1960_FAILED: &str = "No se pudo obtener el pasaje en RVR1960. Inténtelo de nuevo.";
const NTV_FAILED: &str = "No se pudo obtener el pasaje en NTV.";

static LEADING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```json\s*").expect("valid regex"));
static TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```$").expect("valid regex"));

/// The passage text in both translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageText {
    pub rvr1960: String,
    pub ntv: String,
}

impl PassageText {
    fn failed() -> Self {
        Self {
            rvr1960: RVR1960_FAILED.to_string(),
            ntv: NTV_FAILED.to_string(),
        }
    }
}

/// Parse a passage reply, tolerating a ```` ```json ```` fence around it.
///
/// Missing or empty versions are replaced by a notice; an unparseable reply
/// yields the "could not fetch" notices for both.
pub fn parse_passage(raw: &str) -> PassageText {
    #[derive(Deserialize)]
    struct Reply {
        #[serde(default)]
        rvr1960: Option<String>,
        #[serde(default)]
        ntv: Option<String>,
    }

    let without_lead = LEADING_FENCE.replace(raw.trim(), "");
    let cleaned = TRAILING_FENCE.replace(&without_lead, "");

    match serde_json::from_str::<Reply>(cleaned.trim()) {
        Ok(reply) => PassageText {
            rvr1960: reply
                .rvr1960
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| RVR1960_MISSING.to_string()),
            ntv: reply
                .ntv
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NTV_MISSING.to_string()),
        },
        Err(e) => {
            warn!("Failed to parse passage response: {}", e);
            PassageText::failed()
        }
    }
}

/// Merge a suggestion into a field's current value.
pub fn append_suggestion(current: &str, suggestion: &str) -> String {
    if current.is_empty() {
        format!("{}\n{}", SUGGESTION_HEADING, suggestion)
    } else {
        format!("{}\n\n{}\n{}", current, SUGGESTION_HEADING, suggestion)
    }
}

/// HTTP client for a running proxy.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http_client: Client,
    endpoint: String,
}

impl ProxyClient {
    /// `base_url` is the proxy's origin, e.g. `http://127.0.0.1:8888`.
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GENERATE_PATH),
        })
    }

    /// Send one prompt and return the generated text.
    pub async fn generate(&self, prompt: &str, config: Option<serde_json::Value>) -> Result<String> {
        let mut body = json!({ "prompt": prompt });
        if let Some(config) = config {
            body["config"] = config;
        }

        debug!("POST {}", self.endpoint);
        let response = self.http_client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<GenerationResponse>(&text) {
            Ok(GenerationResponse::Text { text }) if status.is_success() => Ok(text),
            Ok(GenerationResponse::Error { error }) => Err(ProxyError::GeminiApi(error)),
            _ => Err(ProxyError::GeminiApi(format!("HTTP {}: {}", status, text))),
        }
    }

    /// Free-text suggestion for a field.
    pub async fn suggest(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, None).await
    }

    /// Look up a passage in both translations.
    ///
    /// Request failures are reported as the "could not fetch" notices rather
    /// than as an error, so a caller can always show something.
    pub async fn fetch_passage(&self, passage: &str) -> PassageText {
        match self.generate(&passage_prompt(passage), None).await {
            Ok(raw) => parse_passage(&raw),
            Err(e) => {
                warn!("Passage lookup for {} failed: {}", passage, e);
                PassageText::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_passage() {
        let raw = "```json\n{\"rvr1960\": \"Porque de tal manera...\", \"ntv\": \"Pues Dios amó...\"}\n```";
        let passage = parse_passage(raw);
        assert_eq!(passage.rvr1960, "Porque de tal manera...");
        assert_eq!(passage.ntv, "Pues Dios amó...");
    }

    #[test]
    fn test_parse_passage_missing_version() {
        let passage = parse_passage(r#"{"rvr1960": "texto"}"#);
        assert_eq!(passage.rvr1960, "texto");
        assert_eq!(passage.ntv, NTV_MISSING);
    }

    #[test]
    fn test_parse_passage_garbage() {
        assert_eq!(parse_passage("Lo siento, no puedo."), PassageText::failed());
    }

    #[test]
    fn test_append_suggestion() {
        assert_eq!(append_suggestion("", "idea"), "Sugerencia AI:\nidea");
        assert_eq!(append_suggestion("notas", "idea"), "notas\n\nSugerencia AI:\nidea");
    }

    #[tokio::test]
    async fn test_fetch_passage_through_proxy() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::Regex("Juan 3:16".to_string()))
            .with_status(200)
            .with_body(r#"{"text":"{\"rvr1960\":\"a\",\"ntv\":\"b\"}"}"#)
            .create_async()
            .await;

        let client = ProxyClient::new(&server.url()).unwrap();
        let passage = client.fetch_passage("Juan 3:16").await;
        assert_eq!(passage, PassageText { rvr1960: "a".to_string(), ntv: "b".to_string() });
    }

    #[tokio::test]
    async fn test_generate_surfaces_proxy_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body(r#"{"error":"API key not configured on server"}"#)
            .create_async()
            .await;

        let client = ProxyClient::new(&server.url()).unwrap();
        let err = client.suggest("hola").await.unwrap_err();
        assert_eq!(err.public_message(), "API key not configured on server");
    }
}
