//! Data models for the proxy and the upstream Gemini API.
//!
//! - `proxy`: inbound `/api/generate` bodies and the provider-facing request
//! - `schema`: structured-output schema descriptors and their normalization
//! - `gemini`: Gemini REST request/response bodies

pub mod gemini;
pub mod proxy;
pub mod schema;

pub use proxy::{GenerateConfig, GenerateReply, GenerationRequest, GenerationResponse, ProviderRequest};
pub use schema::{DescriptorKind, SchemaDescriptor, SchemaType, TypeName};
