// Gemini REST API type definitions (models/{model}:generateContent)

use super::proxy::{GenerateConfig, ProviderRequest};
use super::schema::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Config keys the REST API expects at the top level of the request rather
/// than inside `generationConfig`.
const TOP_LEVEL_KEYS: &[&str] = &[
    "systemInstruction",
    "safetySettings",
    "tools",
    "toolConfig",
    "cachedContent",
];

/// Gemini generate content request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns. The proxy always sends a single user turn.
    pub contents: Vec<Content>,

    /// Generation parameters (schema, mime type, temperature, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    /// Top-level settings lifted out of the client config.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Content in a turn (user or model)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

fn default_role() -> String {
    "model".to_string()
}

/// Individual part of a turn. Only text is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Set on reasoning parts, which are not part of the answer text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
            other: Map::new(),
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<SchemaDescriptor>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateContentRequest {
    /// Build the REST body for a proxied request.
    pub fn from_provider_request(request: &ProviderRequest) -> Self {
        let contents = vec![Content {
            role: "user".to_string(),
            parts: vec![Part::text(request.contents.clone())],
        }];

        let Some(GenerateConfig { response_schema, extra }) = request.config.clone() else {
            return Self {
                contents,
                generation_config: None,
                extra: Map::new(),
            };
        };

        let mut top_level = Map::new();
        let mut generation = Map::new();
        for (key, value) in extra {
            if TOP_LEVEL_KEYS.contains(&key.as_str()) {
                top_level.insert(key, lift_top_level(value));
            } else {
                generation.insert(key, value);
            }
        }

        let generation_config = if response_schema.is_none() && generation.is_empty() {
            None
        } else {
            Some(GenerationConfig {
                response_schema,
                extra: generation,
            })
        };

        Self {
            contents,
            generation_config,
            extra: top_level,
        }
    }
}

/// A bare string system instruction becomes a single-part content.
fn lift_top_level(value: Value) -> Value {
    match value {
        Value::String(text) => json!({ "parts": [{ "text": text }] }),
        other => other,
    }
}

/// Gemini generate content response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// Response candidate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Why a prompt was refused before generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Token usage metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
    #[serde(default)]
    pub total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate, reasoning parts excluded.
    ///
    /// `None` when there is no candidate at all.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();
        Some(text)
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}
