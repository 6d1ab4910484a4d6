// Install-time asset manifest

use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use reqwest::Url;

/// Application shell and third-party assets the assistant needs offline.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "./",
    "./index.html",
    "./index.tsx",
    "./manifest.json",
    "./icon-192x192.png",
    "./icon-512x512.png",
    "https://cdn.tailwindcss.com",
    "https://fonts.googleapis.com/css2?family=Merriweather:ital,wght@0,400;0,700;1,400&family=Source+Sans+3:ital,wght@0,400;0,600;0,700;1,400&display=swap",
    "https://cdnjs.cloudflare.com/ajax/libs/html2canvas/1.4.1/html2canvas.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/jspdf/2.5.1/jspdf.umd.min.js",
    "https://esm.sh/react@^19.1.0",
    "https://esm.sh/react-dom@^19.1.0/",
];

/// A versioned, ordered list of absolute asset URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheManifest {
    cache_name: String,
    urls: Vec<String>,
}

impl CacheManifest {
    /// Resolve `entries` against `origin`. Absolute entries are kept as given;
    /// relative ones (`./index.html`) are joined onto the origin.
    pub fn new<S: AsRef<str>>(cache_name: impl Into<String>, origin: &str, entries: &[S]) -> Result<Self> {
        let urls = entries
            .iter()
            .map(|entry| resolve_url(origin, entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            cache_name: cache_name.into(),
            urls,
        })
    }

    /// Manifest for the configured version tag, falling back to the built-in list.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.assets.manifest.is_empty() {
            Self::new(config.cache_name(), &config.assets.origin, DEFAULT_MANIFEST)
        } else {
            Self::new(config.cache_name(), &config.assets.origin, &config.assets.manifest)
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Resolve `entry` against `origin`; absolute entries win over the origin.
pub fn resolve_url(origin: &str, entry: &str) -> Result<String> {
    let base = Url::parse(origin)
        .map_err(|e| ProxyError::Config(format!("Invalid asset origin '{}': {}", origin, e)))?;
    base.join(entry)
        .map(|u| u.to_string())
        .map_err(|e| ProxyError::Config(format!("Invalid asset URL '{}': {}", entry, e)))
}

/// Canonical form of a request URL, so lookups agree with manifest entries.
pub fn canonical_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
