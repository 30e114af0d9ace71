use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::messaging::Chat;

use super::Result;

/// Trait for basic cache operations.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Returns true if a live value is stored under `key`.
    async fn contains(&self, key: &str) -> Result<bool>;

    /// Sets a value in the cache with an optional TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes all values matching a pattern (e.g., "user:*").
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Replaces every value matching `pattern` with exactly `entries`.
    ///
    /// Readers observe either the old set or the new one, never a mix.
    async fn replace_pattern(
        &self,
        pattern: &str,
        entries: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> Result<()>;
}

/// Trait for chat update broadcasting.
#[async_trait]
pub trait CachePubSub: Send + Sync {
    /// Publishes a chat snapshot to the subscribers of its id.
    async fn publish(&self, chat_id: &str, chat: &Chat) -> Result<()>;

    /// Subscribes to snapshots of a specific chat.
    async fn subscribe(&self, chat_id: &str) -> Result<broadcast::Receiver<Chat>>;
}
