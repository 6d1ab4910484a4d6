// Inbound proxy request/response types and the provider-facing request

use super::schema::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default)]
    pub config: Option<GenerateConfig>,
}

impl GenerationRequest {
    /// The prompt, if present and non-empty.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.is_empty())
    }
}

/// Structured-output configuration as sent by the client.
///
/// Only `responseSchema` is interpreted; any other setting
/// (`responseMimeType`, `temperature`, `systemInstruction`, ...) is forwarded
/// as received.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<SchemaDescriptor>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateConfig {
    pub fn normalize(self) -> Self {
        Self {
            response_schema: self.response_schema.map(SchemaDescriptor::normalize),
            extra: self.extra,
        }
    }
}

/// What the proxy hands to the generation provider: one prompt, optional config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub model: String,
    pub contents: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateConfig>,
}

/// Successful proxy reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateReply {
    pub text: String,
}

/// Either shape the proxy can answer with, as seen by a caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Text { text: String },
    Error { error: String },
}
