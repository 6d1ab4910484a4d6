//! Offline asset cache.
//!
//! A cache generation is named after a version tag. Installing it fetches the
//! manifest and stores every response as one batch; fetches are answered from
//! any store before touching the network; activating it deletes every store
//! with a different name. Bumping the version tag is the only way entries are
//! ever evicted.
//!
//! # Components
//!
//! - `manifest`: the versioned URL list and URL resolution.
//! - `storage`: named stores, in memory or on disk.
//! - `fetcher`: live network access.
//! - `lifecycle`: the install / fetch / activate state machine.

pub mod fetcher;
pub mod lifecycle;
pub mod manifest;
pub mod models;
pub mod storage;

pub use fetcher::{Fetcher, HttpFetcher};
pub use lifecycle::OfflineCache;
pub use manifest::{canonical_url, resolve_url, CacheManifest, DEFAULT_MANIFEST};
pub use models::{
    ActivateReport, AssetRequest, CachedResponse, FetchOutcome, FetchSource, InstallReport,
    LifecycleState,
};
pub use storage::{CacheStorage, DiskStorage, MemoryStorage};
