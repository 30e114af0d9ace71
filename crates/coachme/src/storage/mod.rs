//! Storage backend implementations.
//!
//! This module provides concrete implementations of the store traits
//! defined in `coachme_core::storage`, plus the caching decorator that sits
//! in front of them. The backend is selected at compile time via feature
//! flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process HashMap backend
//! - `sqlite`: SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time.
//!
//! # Examples
//!
//! Build with the in-memory backend (default):
//! ```bash
//! cargo build -p coachme
//! ```
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p coachme --no-default-features --features sqlite
//! ```

// Compile-time checks for mutual exclusivity
#[cfg(all(feature = "inmemory", feature = "sqlite"))]
compile_error!(
    "Features 'inmemory' and 'sqlite' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'sqlite' feature. \
    Example: cargo build -p coachme --features sqlite"
);

use std::sync::Arc;

use coachme_core::storage::Result;

use crate::cache::{MemoryCache, MemoryPubSub};
use crate::config::Config;

pub mod cached;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use cached::CachingStore;

/// The remote store selected by feature flags.
#[cfg(feature = "inmemory")]
pub type Backend = inmemory::InMemoryStore;

/// The remote store selected by feature flags.
#[cfg(feature = "sqlite")]
pub type Backend = sqlite::SqliteStore;

/// The application store: the active backend behind the in-process cache.
pub type AppStore = CachingStore<Backend, MemoryCache, MemoryPubSub>;

/// Opens the backend selected at compile time.
#[cfg(feature = "inmemory")]
pub async fn open_backend(_config: &Config) -> Result<Backend> {
    Ok(inmemory::InMemoryStore::new())
}

/// Opens the backend selected at compile time.
#[cfg(feature = "sqlite")]
pub async fn open_backend(config: &Config) -> Result<Backend> {
    tracing::debug!(path = %config.sqlite_path, "Opening SQLite store");
    sqlite::SqliteStore::new(&config.sqlite_path).await
}

/// Wraps `backend` with the cache and pub/sub configured in `config`.
pub fn build_store(backend: Arc<Backend>, config: &Config) -> AppStore {
    let cache = Arc::new(MemoryCache::new(config.cache_capacity()));
    let pubsub = Arc::new(MemoryPubSub::with_capacity(config.pubsub_channel_capacity));
    CachingStore::new(backend, cache, pubsub, config.cache_ttl())
}
