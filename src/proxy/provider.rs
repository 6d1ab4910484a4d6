// Generation provider seam

use crate::config::ApiKey;
use crate::error::Result;
use crate::models::ProviderRequest;
use async_trait::async_trait;

/// Upstream text generator the proxy forwards to.
///
/// One call, one answer: implementations must not retry, stream or
/// override timeouts.
#[async_trait]
pub trait GenerationProvider: Send + Sync + 'static {
    async fn generate(&self, api_key: &ApiKey, request: ProviderRequest) -> Result<String>;
}
