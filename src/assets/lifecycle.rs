// Install / fetch / activate lifecycle of one cache generation

use super::fetcher::Fetcher;
use super::manifest::CacheManifest;
use super::models::{
    ActivateReport, AssetRequest, CachedResponse, FetchOutcome, FetchSource, InstallReport,
    LifecycleState,
};
use super::storage::CacheStorage;
use crate::error::{ProxyError, Result};
use futures::future::try_join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One generation of the offline asset cache, identified by its manifest's
/// cache name.
///
/// Contract: `install` runs once from `Parsed`, and `activate` may only be
/// called after `install` has completed successfully, in this process or in
/// an earlier one picked up by `resume_installed`. Both are checked and
/// rejected with [`ProxyError::Lifecycle`] otherwise. `handle_fetch` is valid
/// in every state.
pub struct OfflineCache {
    manifest: CacheManifest,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: Mutex<LifecycleState>,
}

impl OfflineCache {
    pub fn new(
        manifest: CacheManifest,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            manifest,
            storage,
            fetcher,
            state: Mutex::new(LifecycleState::Parsed),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub fn cache_name(&self) -> &str {
        self.manifest.cache_name()
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(ProxyError::Lifecycle(format!(
                "cannot move {} from {} to {} (expected {})",
                self.manifest.cache_name(),
                *state,
                to,
                from
            )));
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: LifecycleState) {
        *self.state.lock() = to;
    }

    /// Populate the store from the manifest.
    ///
    /// All fetches are issued together. The batch is committed only if every
    /// one of them returns an OK status; otherwise nothing is stored and this
    /// generation becomes `Redundant`.
    pub async fn install(&self) -> Result<InstallReport> {
        self.transition(LifecycleState::Parsed, LifecycleState::Installing)?;
        info!("Installing asset cache {}", self.cache_name());

        match self.populate().await {
            Ok(entries) => {
                self.set_state(LifecycleState::Installed);
                info!("Cached {} assets in {}", entries, self.cache_name());
                Ok(InstallReport {
                    cache_name: self.cache_name().to_string(),
                    entries,
                })
            }
            Err(e) => {
                self.set_state(LifecycleState::Redundant);
                warn!("Install of {} failed, serving from network only: {}", self.cache_name(), e);
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize> {
        let name = self.cache_name();
        self.storage.open(name).await?;

        let fetches = self.manifest.urls().iter().map(|url| self.fetch_for_install(url));
        let responses = try_join_all(fetches).await?;

        let count = responses.len();
        self.storage.put_all(name, responses).await?;
        Ok(count)
    }

    async fn fetch_for_install(&self, url: &str) -> Result<CachedResponse> {
        let response = self.fetcher.fetch(&AssetRequest::get(url)).await?;
        if !response.is_ok() {
            return Err(ProxyError::Cache(format!(
                "Request for {} failed with status {}",
                url, response.status
            )));
        }
        Ok(response)
    }

    /// Pick up an install completed by an earlier run.
    ///
    /// Moves `Parsed` to `Installed` when this generation's store already holds
    /// every manifest URL. Returns `false` and leaves the state alone otherwise.
    pub async fn resume_installed(&self) -> Result<bool> {
        if self.state() != LifecycleState::Parsed {
            return Err(ProxyError::Lifecycle(format!(
                "cannot resume {} from {}",
                self.cache_name(),
                self.state()
            )));
        }

        let name = self.cache_name();
        for url in self.manifest.urls() {
            if self.storage.match_in(name, &AssetRequest::get(url)).await?.is_none() {
                debug!("{} is missing {}", name, url);
                return Ok(false);
            }
        }

        self.transition(LifecycleState::Parsed, LifecycleState::Installed)?;
        info!("Resumed installed asset cache {}", name);
        Ok(true)
    }

    /// Answer a request from any store if possible, otherwise from the network.
    ///
    /// Network responses are returned unmodified and never stored. A failing
    /// store lookup is logged and treated as a miss.
    pub async fn handle_fetch(&self, request: &AssetRequest) -> Result<FetchOutcome> {
        match self.storage.match_any(request).await {
            Ok(Some(response)) => {
                debug!("Cache hit {}", request.url);
                return Ok(FetchOutcome {
                    source: FetchSource::Cache,
                    response,
                });
            }
            Ok(None) => debug!("Cache miss {}", request.url),
            Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
        }

        let response = self.fetcher.fetch(request).await?;
        Ok(FetchOutcome {
            source: FetchSource::Network,
            response,
        })
    }

    /// Delete every store except this generation's.
    pub async fn activate(&self) -> Result<ActivateReport> {
        self.transition(LifecycleState::Installed, LifecycleState::Activating)?;

        match self.prune().await {
            Ok(deleted) => {
                self.set_state(LifecycleState::Activated);
                info!("Activated {}, removed {} old cache(s)", self.cache_name(), deleted.len());
                Ok(ActivateReport {
                    kept: self.cache_name().to_string(),
                    deleted,
                })
            }
            Err(e) => {
                self.set_state(LifecycleState::Installed);
                Err(e)
            }
        }
    }

    async fn prune(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != self.cache_name())
            .collect();

        try_join_all(stale.iter().map(|name| async move {
            debug!("Deleting stale cache {}", name);
            self.storage.delete(name).await
        }))
        .await?;

        Ok(stale)
    }
}
