//! Named cache stores.
//!
//! A `CacheStorage` holds any number of named stores, each a map from
//! absolute URL to a response snapshot. Stores are listed in creation order
//! and lookups across stores search them in that order.

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use super::models::{AssetRequest, CachedResponse};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    /// Create the named store if it does not exist yet.
    async fn open(&self, name: &str) -> Result<()>;

    /// Names of all stores, oldest first.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove a store and every entry in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Write a batch of entries into a store as one unit: either all of them
    /// become visible or none do. The store is created if absent.
    async fn put_all(&self, name: &str, entries: Vec<CachedResponse>) -> Result<()>;

    /// Exact-URL lookup in one store.
    async fn match_in(&self, name: &str, request: &AssetRequest) -> Result<Option<CachedResponse>>;

    /// Number of entries in a store; zero if the store does not exist.
    async fn len(&self, name: &str) -> Result<usize>;

    /// Exact-URL lookup across every store, oldest first. Non-GET requests
    /// never match.
    async fn match_any(&self, request: &AssetRequest) -> Result<Option<CachedResponse>> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        for name in self.keys().await? {
            if let Some(hit) = self.match_in(&name, request).await? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}
