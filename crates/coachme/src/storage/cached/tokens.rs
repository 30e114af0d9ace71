//! Push token operations of the caching store.

use async_trait::async_trait;

use coachme_core::cache::{push_token_key, Cache, CachePubSub};
use coachme_core::storage::{PushTokenStore, RemoteStore, Result};

use super::CachingStore;

#[async_trait]
impl<R, C, P> PushTokenStore for CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    async fn get_push_token(&self, email: &str) -> Result<String> {
        let cache_key = push_token_key(email);

        if let Some(token) = self.cache_get::<String>(&cache_key).await {
            return Ok(token);
        }

        let token = self.remote.get_push_token(email).await?;
        self.cache_put(&cache_key, &token).await;

        Ok(token)
    }

    async fn set_push_token(&self, email: &str, token: &str) -> Result<()> {
        let cache_key = push_token_key(email);
        self.cache_evict(&cache_key).await;

        if let Err(err) = self.remote.set_push_token(email, token).await {
            tracing::warn!(email = %email, error = %err, "Push token update failed, cache evicted");
            return Err(err);
        }

        self.cache_put(&cache_key, &token).await;

        tracing::debug!(email = %email, "Push token registered");
        Ok(())
    }
}
