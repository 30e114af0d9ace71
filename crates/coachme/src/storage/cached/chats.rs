//! Chat operations of the caching store.
//!
//! Chat writes only touch a chat that is already cached: the cached copy is
//! updated in place, the write is forwarded, and once the remote store
//! accepted it the cached chat as it stands then is published to
//! subscribers. A failed write evicts the chat so the next read refetches it.

use async_trait::async_trait;
use tokio::sync::broadcast;

use coachme_core::cache::{self, chat_key, Cache, CachePubSub};
use coachme_core::messaging::{mark_other_users_messages_as_read, Chat, Message};
use coachme_core::storage::{ChatStore, RemoteStore, Result, StoreError};

use super::CachingStore;

impl<R, C, P> CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    /// Subscribes to every snapshot this store publishes for `chat_id`.
    ///
    /// Dropping the receiver unsubscribes.
    pub async fn subscribe_chat(&self, chat_id: &str) -> cache::Result<broadcast::Receiver<Chat>> {
        self.pubsub.subscribe(chat_id).await
    }

    /// Applies `change` to the cached copy of a chat, if there is one.
    async fn modify_cached_chat<F>(&self, chat_id: &str, change: F)
    where
        F: FnOnce(Chat) -> Chat + Send,
    {
        let _guard = self.chat_cache.lock().await;

        let cache_key = chat_key(chat_id);
        if let Some(chat) = self.cache_get::<Chat>(&cache_key).await {
            self.cache_put(&cache_key, &change(chat)).await;
        }
    }

    /// Settles a forwarded chat write: evict on failure, publish on success.
    ///
    /// The published snapshot is read back under `chat_cache`, so it holds
    /// every change applied to the cached copy so far.
    async fn finish_chat_write(&self, chat_id: &str, outcome: Result<()>) -> Result<()> {
        let cache_key = chat_key(chat_id);

        if let Err(err) = outcome {
            tracing::warn!(chat_id = %chat_id, error = %err, "Chat write failed, cache evicted");
            self.cache_evict(&cache_key).await;
            return Err(err);
        }

        let _guard = self.chat_cache.lock().await;
        if let Some(chat) = self.cache_get::<Chat>(&cache_key).await {
            self.publish_chat(&chat).await;
        }
        Ok(())
    }
}

#[async_trait]
impl<R, C, P> ChatStore for CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        let cache_key = chat_key(chat_id);

        if let Some(chat) = self.cache_get::<Chat>(&cache_key).await {
            return Ok(chat);
        }

        let chat = self.remote.get_chat(chat_id).await?;
        self.cache_put(&cache_key, &chat).await;

        Ok(chat)
    }

    async fn update_chat_participants(&self, chat_id: &str, participants: &[String]) -> Result<()> {
        self.modify_cached_chat(chat_id, |mut chat| {
            chat.participants = participants.to_vec();
            chat
        })
        .await;

        let outcome = self
            .remote
            .update_chat_participants(chat_id, participants)
            .await;
        self.finish_chat_write(chat_id, outcome).await?;

        tracing::debug!(chat_id = %chat_id, participants = participants.len(), "Chat participants updated");
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        self.modify_cached_chat(chat_id, |mut chat| {
            chat.messages.push(message.clone());
            chat
        })
        .await;

        let outcome = self.remote.send_message(chat_id, message).await;
        self.finish_chat_write(chat_id, outcome).await?;
        self.refresh_contact_row(chat_id, None, Some(message)).await;

        tracing::debug!(chat_id = %chat_id, sender = %message.sender, "Message sent");
        Ok(())
    }

    async fn mark_messages_as_read(&self, chat_id: &str, email: &str) -> Result<()> {
        if email.is_empty() {
            return Err(StoreError::InvalidData("Viewer email is empty".to_string()));
        }

        self.modify_cached_chat(chat_id, |chat| {
            mark_other_users_messages_as_read(&chat, email)
        })
        .await;

        let outcome = self.remote.mark_messages_as_read(chat_id, email).await;
        self.finish_chat_write(chat_id, outcome).await?;

        tracing::debug!(chat_id = %chat_id, viewer = %email, "Messages marked as read");
        Ok(())
    }
}
