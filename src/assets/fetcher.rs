// Network access for the asset cache

use super::models::{AssetRequest, CachedResponse};
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Performs a live network fetch.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, request: &AssetRequest) -> Result<CachedResponse>;
}

/// `reqwest`-backed fetcher. No timeout is applied: a hung request waits.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(concat!("sermon-assist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<CachedResponse> {
        debug!("Network fetch {} {}", request.method, request.url);

        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await?;

        Ok(CachedResponse {
            url: request.url.clone(),
            status,
            headers,
            body,
            stored_at: chrono::Utc::now(),
        })
    }
}
