//! Read-through caching store.
//!
//! Wraps a `RemoteStore` implementation with the cache-aside pattern.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use coachme_core::cache::{self, decode, encode, user_key, Cache, CachePubSub};
use coachme_core::messaging::Chat;
use coachme_core::storage::{RemoteStore, Result, SessionStore, StoreError};

use super::schedule::ScheduleCache;

/// Read-through caching store.
///
/// Implements the cache-aside pattern:
/// - **Reads**: Check cache first, on miss fetch from the remote store and populate cache
/// - **Writes**: Evict the key, persist remotely, repopulate on success
///
/// Cache failures never fail an operation; they are logged and treated as a
/// miss. Remote failures propagate unchanged.
///
/// # Type Parameters
///
/// * `R` - The remote store implementation
/// * `C` - The cache implementation
/// * `P` - The pub/sub implementation used to broadcast chat updates
pub struct CachingStore<R, C, P>
where
    R: RemoteStore,
    C: Cache,
    P: CachePubSub,
{
    pub(super) remote: Arc<R>,
    pub(super) cache: Arc<C>,
    pub(super) pubsub: Arc<P>,
    pub(super) ttl: Option<Duration>,
    /// Held for the whole of a composite read-modify-write on a user.
    pub(super) rmw: Mutex<()>,
    /// Held while a cached chat copy is loaded, changed and stored back.
    pub(super) chat_cache: Mutex<()>,
    /// Held while the cached contact list is loaded, changed and stored back.
    pub(super) contact_rows: Mutex<()>,
    /// The current user's schedule around the displayed week.
    pub(super) schedule: Mutex<ScheduleCache>,
}

impl<R, C, P> CachingStore<R, C, P>
where
    R: RemoteStore,
    C: Cache,
    P: CachePubSub,
{
    /// Creates a new caching store.
    ///
    /// # Arguments
    ///
    /// * `remote` - The remote store to cache
    /// * `cache` - The cache implementation
    /// * `pubsub` - Broadcasts updated chats to subscribers
    /// * `ttl` - Time-to-live for cached records, `None` to never expire
    pub fn new(remote: Arc<R>, cache: Arc<C>, pubsub: Arc<P>, ttl: Option<Duration>) -> Self {
        Self {
            remote,
            cache,
            pubsub,
            ttl,
            rmw: Mutex::new(()),
            chat_cache: Mutex::new(()),
            contact_rows: Mutex::new(()),
            schedule: Mutex::new(ScheduleCache::default()),
        }
    }

    /// Returns true if the user record for `email` is currently cached.
    pub async fn is_cached(&self, email: &str) -> bool {
        match self.cache.contains(&user_key(email)).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(email = %email, error = %err, "Cache lookup failed");
                false
            }
        }
    }

    /// Drops every cached record and the cached schedule. Called when the
    /// session ends.
    pub async fn clear_cache(&self) {
        if let Err(err) = self.cache.delete_pattern("*").await {
            tracing::warn!(error = %err, "Failed to clear cache");
        }
        *self.schedule.lock().await = ScheduleCache::default();
        tracing::debug!("Cache cleared");
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> cache::Result<Option<T>> {
        match self.cache.get(key).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write_cached<T: Serialize + Sync>(&self, key: &str, value: &T) -> cache::Result<()> {
        let bytes = encode(value)?;
        self.cache.set(key, &bytes, self.ttl).await
    }

    /// Reads a cached record. Unreadable entries count as a miss.
    pub(super) async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read_cached(key).await {
            Ok(Some(value)) => {
                tracing::trace!(key = %key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                tracing::trace!(key = %key, "Cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Cache read failed, treated as a miss");
                None
            }
        }
    }

    pub(super) async fn cache_put<T: Serialize + Sync>(&self, key: &str, value: &T) {
        if let Err(err) = self.write_cached(key, value).await {
            tracing::warn!(key = %key, error = %err, "Failed to cache value");
        }
    }

    pub(super) async fn cache_evict(&self, key: &str) {
        if let Err(err) = self.cache.delete(key).await {
            tracing::warn!(key = %key, error = %err, "Failed to invalidate cache");
        }
    }

    pub(super) async fn publish_chat(&self, chat: &Chat) {
        if let Err(err) = self.pubsub.publish(&chat.id, chat).await {
            tracing::warn!(chat_id = %chat.id, error = %err, "Failed to publish chat update");
        }
    }
}

#[async_trait]
impl<R, C, P> SessionStore for CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    async fn get_current_email(&self) -> Result<String> {
        let email = self.remote.get_current_email().await?;
        if email.is_empty() {
            return Err(StoreError::NoCurrentUser);
        }
        Ok(email)
    }

    async fn set_current_email(&self, email: &str) -> Result<()> {
        self.remote.set_current_email(email).await
    }
}
