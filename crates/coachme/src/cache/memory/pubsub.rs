//! In-memory pub/sub implementation.
//!
//! Provides a thread-safe pub/sub mechanism for chat snapshots using
//! tokio broadcast channels.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use coachme_core::cache::{CachePubSub, Result};
use coachme_core::messaging::Chat;

/// Default channel capacity for pub/sub messages.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// In-memory pub/sub implementation.
///
/// Each chat id has its own broadcast channel, opened by the first
/// subscriber and dropped by the first publish that finds no receiver left.
/// A lagging subscriber misses the oldest snapshots once `capacity` is
/// exceeded, which is harmless since every snapshot carries the whole chat.
#[derive(Debug, Clone)]
pub struct MemoryPubSub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<Chat>>>>,
    capacity: usize,
}

impl MemoryPubSub {
    /// Creates a new empty pub/sub instance.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a pub/sub whose channels buffer up to `capacity` snapshots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    async fn get_or_create_channel(&self, chat_id: &str) -> broadcast::Sender<Chat> {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(chat_id) {
                return sender.clone();
            }
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(chat_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    #[cfg(test)]
    async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CachePubSub for MemoryPubSub {
    async fn publish(&self, chat_id: &str, chat: &Chat) -> Result<()> {
        let mut channels = self.channels.write().await;
        let Some(sender) = channels.get(chat_id) else {
            return Ok(());
        };

        if sender.send(chat.clone()).is_err() {
            // Every receiver was dropped
            channels.remove(chat_id);
            tracing::trace!(chat_id = %chat_id, "Closed chat channel without subscribers");
        }

        Ok(())
    }

    async fn subscribe(&self, chat_id: &str) -> Result<broadcast::Receiver<Chat>> {
        let sender = self.get_or_create_channel(chat_id).await;
        Ok(sender.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let pubsub = MemoryPubSub::new();
        let chat = Chat::personal("a@x.com", "b@x.com");

        let mut receiver = pubsub.subscribe(&chat.id).await.unwrap();
        pubsub.publish(&chat.id, &chat).await.unwrap();

        assert_eq!(receiver.recv().await.unwrap(), chat);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let pubsub = MemoryPubSub::new();
        let chat = Chat::personal("a@x.com", "b@x.com");

        let mut receiver1 = pubsub.subscribe(&chat.id).await.unwrap();
        let mut receiver2 = pubsub.subscribe(&chat.id).await.unwrap();
        pubsub.publish(&chat.id, &chat).await.unwrap();

        assert_eq!(receiver1.recv().await.unwrap().id, chat.id);
        assert_eq!(receiver2.recv().await.unwrap().id, chat.id);
    }

    #[tokio::test]
    async fn test_subscriptions_are_per_chat() {
        let pubsub = MemoryPubSub::new();
        let chat1 = Chat::personal("a@x.com", "b@x.com");
        let chat2 = Chat::personal("a@x.com", "c@x.com");

        let mut receiver1 = pubsub.subscribe(&chat1.id).await.unwrap();
        let mut receiver2 = pubsub.subscribe(&chat2.id).await.unwrap();

        pubsub.publish(&chat2.id, &chat2).await.unwrap();
        pubsub.publish(&chat1.id, &chat1).await.unwrap();

        assert_eq!(receiver1.recv().await.unwrap().id, chat1.id);
        assert_eq!(receiver2.recv().await.unwrap().id, chat2.id);
        assert!(receiver1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_no_subscribers_opens_no_channel() {
        let pubsub = MemoryPubSub::new();

        for i in 0..50 {
            let chat = Chat::new(format!("chat-{i}"), vec![]);
            assert!(pubsub.publish(&chat.id, &chat).await.is_ok());
        }

        assert_eq!(pubsub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_channel_dropped_once_unsubscribed() {
        let pubsub = MemoryPubSub::new();
        let chat = Chat::personal("a@x.com", "b@x.com");

        let receiver = pubsub.subscribe(&chat.id).await.unwrap();
        assert_eq!(pubsub.channel_count().await, 1);

        drop(receiver);
        pubsub.publish(&chat.id, &chat).await.unwrap();
        assert_eq!(pubsub.channel_count().await, 0);

        // A later subscriber gets a fresh channel
        let mut receiver = pubsub.subscribe(&chat.id).await.unwrap();
        pubsub.publish(&chat.id, &chat).await.unwrap();
        assert_eq!(receiver.recv().await.unwrap(), chat);
    }

    #[tokio::test]
    async fn test_channel_reuse() {
        let pubsub = MemoryPubSub::with_capacity(4);

        let _receiver1 = pubsub.subscribe("chat").await.unwrap();
        let _receiver2 = pubsub.subscribe("chat").await.unwrap();

        assert_eq!(pubsub.channel_count().await, 1);
    }
}
