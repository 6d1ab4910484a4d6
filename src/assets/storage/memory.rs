// In-process cache storage

use super::CacheStorage;
use crate::assets::manifest::canonical_url;
use crate::assets::models::{AssetRequest, CachedResponse};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache storage that lives as long as the process.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    /// Stores in creation order; each maps canonical URL → snapshot
    stores: Arc<RwLock<Vec<(String, HashMap<String, CachedResponse>)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut stores = self.stores.write().await;
        if !stores.iter().any(|(n, _)| n == name) {
            debug!("Creating cache store {}", name);
            stores.push((name.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.stores.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(n, _)| n != name);
        Ok(stores.len() != before)
    }

    async fn put_all(&self, name: &str, entries: Vec<CachedResponse>) -> Result<()> {
        // single write guard: readers see all of the batch or none of it
        let mut stores = self.stores.write().await;
        let index = match stores.iter().position(|(n, _)| n == name) {
            Some(i) => i,
            None => {
                stores.push((name.to_string(), HashMap::new()));
                stores.len() - 1
            }
        };
        let store = &mut stores[index].1;
        for entry in entries {
            store.insert(canonical_url(&entry.url), entry);
        }
        Ok(())
    }

    async fn match_in(&self, name: &str, request: &AssetRequest) -> Result<Option<CachedResponse>> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        let key = canonical_url(&request.url);
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, store)| store.get(&key).cloned()))
    }

    async fn len(&self, name: &str) -> Result<usize> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, store)| store.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::Method;

    fn snapshot(url: &str) -> CachedResponse {
        CachedResponse {
            url: url.to_string(),
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::from_static(b"<html></html>"),
            stored_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_open_is_idempotent_and_ordered() {
        let storage = MemoryStorage::new();
        storage.open("a").await.unwrap();
        storage.open("b").await.unwrap();
        storage.open("a").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_match_is_exact_and_get_only() {
        let storage = MemoryStorage::new();
        storage.put_all("v1", vec![snapshot("https://x.test/index.html")]).await.unwrap();

        assert!(storage.match_any(&AssetRequest::get("https://x.test/index.html")).await.unwrap().is_some());
        assert!(storage.match_any(&AssetRequest::get("https://x.test/index.htm")).await.unwrap().is_none());

        let post = AssetRequest { method: Method::POST, url: "https://x.test/index.html".to_string() };
        assert!(storage.match_any(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_entries() {
        let storage = MemoryStorage::new();
        storage.put_all("v1", vec![snapshot("https://x.test/")]).await.unwrap();
        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert_eq!(storage.len("v1").await.unwrap(), 0);
        assert!(storage.match_any(&AssetRequest::get("https://x.test/")).await.unwrap().is_none());
    }
}
