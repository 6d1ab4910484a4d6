//! The generation proxy: validates `/api/generate` calls, normalizes the
//! optional response schema, and forwards a single request to the provider.

mod provider;
mod service;

pub use provider::GenerationProvider;
pub use service::ProxyService;
