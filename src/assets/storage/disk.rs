// On-disk cache storage shared by every process pointed at the same directory

use super::CacheStorage;
use crate::assets::manifest::canonical_url;
use crate::assets::models::{AssetRequest, CachedResponse};
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const INDEX_FILE: &str = "index.json";

/// Cache storage rooted at a directory.
///
/// Layout: one sub-directory per store (hex-encoded name) holding an
/// `index.json` and one content-addressed body file per entry. A batch only
/// becomes visible when the new index is renamed into place.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreIndex {
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    entries: BTreeMap<String, EntryMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    body_file: String,
    stored_at: DateTime<Utc>,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }

    fn body_file_name(entry: &CachedResponse) -> String {
        let mut hasher = Sha256::new();
        hasher.update(entry.url.as_bytes());
        hasher.update(&entry.body);
        format!("{:x}.body", hasher.finalize())
    }

    /// Recover a store name from its directory name.
    fn store_name(dir_name: &std::ffi::OsStr) -> Option<String> {
        let bytes = hex::decode(dir_name.to_str()?).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Remove body files the index no longer references.
    async fn sweep_bodies(dir: &Path, index: &StoreIndex) -> Result<usize> {
        let live: HashSet<&str> = index.entries.values().map(|m| m.body_file.as_str()).collect();
        let mut removed = 0;
        let mut read_dir = fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.ends_with(".body") && !live.contains(file_name) {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn read_index(dir: &Path) -> Result<Option<StoreIndex>> {
        match fs::read(dir.join(INDEX_FILE)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the index through a temp file and rename, so readers never see a
    /// half-written index.
    async fn write_index(dir: &Path, index: &StoreIndex) -> Result<()> {
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        fs::write(&tmp, serde_json::to_vec_pretty(index)?).await?;
        fs::rename(&tmp, dir.join(INDEX_FILE)).await?;
        Ok(())
    }

    async fn load_or_create(&self, name: &str) -> Result<(PathBuf, StoreIndex)> {
        let dir = self.store_dir(name);
        if let Some(index) = Self::read_index(&dir).await? {
            return Ok((dir, index));
        }
        fs::create_dir_all(&dir).await?;
        let index = StoreIndex {
            name: name.to_string(),
            created_at: Utc::now(),
            entries: BTreeMap::new(),
        };
        Self::write_index(&dir, &index).await?;
        debug!("Created cache store {} at {}", name, dir.display());
        Ok((dir, index))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> Result<()> {
        self.load_or_create(name).await.map(|_| ())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut read_dir = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stores = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match Self::read_index(&entry.path()).await {
                Ok(Some(index)) => stores.push((index.created_at, index.name)),
                Ok(None) | Err(_) => {
                    // Listed as oldest so the next activation deletes it
                    let Some(name) = Self::store_name(&entry.file_name()) else {
                        continue;
                    };
                    warn!("Cache store {} has no readable index", name);
                    stores.push((DateTime::<Utc>::MIN_UTC, name));
                }
            }
        }

        stores.sort();
        Ok(stores.into_iter().map(|(_, name)| name).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.store_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_all(&self, name: &str, entries: Vec<CachedResponse>) -> Result<()> {
        let (dir, mut index) = self.load_or_create(name).await?;

        for entry in entries {
            let body_file = Self::body_file_name(&entry);
            fs::write(dir.join(&body_file), &entry.body).await?;
            index.entries.insert(
                canonical_url(&entry.url),
                EntryMeta {
                    url: entry.url,
                    status: entry.status,
                    headers: entry.headers,
                    body_file,
                    stored_at: entry.stored_at,
                },
            );
        }

        Self::write_index(&dir, &index).await?;

        let removed = Self::sweep_bodies(&dir, &index).await?;
        if removed > 0 {
            debug!("Removed {} stale body file(s) from {}", removed, name);
        }
        Ok(())
    }

    async fn match_in(&self, name: &str, request: &AssetRequest) -> Result<Option<CachedResponse>> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        let dir = self.store_dir(name);
        let Some(index) = Self::read_index(&dir).await? else {
            return Ok(None);
        };
        let Some(meta) = index.entries.get(&canonical_url(&request.url)) else {
            return Ok(None);
        };

        let body = fs::read(dir.join(&meta.body_file)).await.map_err(|e| {
            ProxyError::Cache(format!("Missing body for {} in {}: {}", meta.url, name, e))
        })?;

        Ok(Some(CachedResponse {
            url: meta.url.clone(),
            status: meta.status,
            headers: meta.headers.clone(),
            body: Bytes::from(body),
            stored_at: meta.stored_at,
        }))
    }

    async fn len(&self, name: &str) -> Result<usize> {
        Ok(Self::read_index(&self.store_dir(name))
            .await?
            .map(|index| index.entries.len())
            .unwrap_or(0))
    }
}
