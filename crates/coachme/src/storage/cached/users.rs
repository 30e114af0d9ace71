//! User operations of the caching store.

use async_trait::async_trait;

use coachme_core::cache::{encode, user_key, Cache, CachePubSub, USERS_PATTERN};
use coachme_core::storage::{RemoteStore, Result, SessionStore, UserStore};
use coachme_core::user::{
    add_rating, append_events, average_rating, prepend_chat_contact, sort_users_by_distance,
    Event, UserInfo,
};

use super::CachingStore;

#[async_trait]
impl<R, C, P> UserStore for CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    async fn get_user(&self, email: &str) -> Result<UserInfo> {
        let cache_key = user_key(email);

        if let Some(user) = self.cache_get::<UserInfo>(&cache_key).await {
            return Ok(user);
        }

        // Cache miss - fetch from remote; failures are not cached
        let user = self.remote.get_user(email).await?;
        self.cache_put(&cache_key, &user).await;

        Ok(user)
    }

    async fn update_user(&self, user: &UserInfo) -> Result<()> {
        let cache_key = user_key(&user.email);

        // 1. Evict so a failed write never leaves the old or new record behind
        self.cache_evict(&cache_key).await;

        // 2. Persist remotely
        if let Err(err) = self.remote.update_user(user).await {
            tracing::warn!(email = %user.email, error = %err, "User update failed, cache evicted");
            return Err(err);
        }

        // 3. Cache the confirmed record
        self.cache_put(&cache_key, user).await;

        tracing::debug!(email = %user.email, "User updated");
        Ok(())
    }

    async fn get_all_users(&self) -> Result<Vec<UserInfo>> {
        let users = self.remote.get_all_users().await?;

        let mut entries = Vec::with_capacity(users.len());
        for user in &users {
            match encode(user) {
                Ok(bytes) => entries.push((user_key(&user.email), bytes)),
                Err(err) => {
                    tracing::warn!(email = %user.email, error = %err, "Failed to serialize user for cache");
                }
            }
        }

        if let Err(err) = self
            .cache
            .replace_pattern(USERS_PATTERN, entries, self.ttl)
            .await
        {
            tracing::warn!(error = %err, "Failed to refresh user cache");
        }

        tracing::debug!(count = users.len(), "User cache refreshed");
        Ok(users)
    }

    async fn user_exists(&self, email: &str) -> Result<bool> {
        if self.is_cached(email).await {
            return Ok(true);
        }
        self.remote.user_exists(email).await
    }
}

impl<R, C, P> CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    /// Appends `events` to a user's agenda and returns the updated record.
    pub async fn add_events_to_user(&self, email: &str, events: &[Event]) -> Result<UserInfo> {
        let _guard = self.rmw.lock().await;

        let user = self.get_user(email).await?;
        let updated = append_events(&user, events);
        self.update_user(&updated).await?;

        tracing::debug!(email = %email, added = events.len(), "Events added to user");
        Ok(updated)
    }

    /// Lists every user, nearest to the given point first.
    pub async fn get_all_users_by_nearest(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<UserInfo>> {
        let users = self.get_all_users().await?;
        Ok(sort_users_by_distance(users, latitude, longitude))
    }

    /// Records the current user's rating of a coach and returns the updated coach.
    pub async fn add_rating_to_coach(&self, coach_email: &str, rating: u8) -> Result<UserInfo> {
        let _guard = self.rmw.lock().await;

        let rater = self.get_current_email().await?;
        let coach = self.get_user(coach_email).await?;
        let updated = add_rating(&coach, &rater, rating)?;
        self.update_user(&updated).await?;

        tracing::debug!(coach = %coach_email, rater = %rater, rating, "Coach rated");
        Ok(updated)
    }

    /// Average rating of a coach, zero when nobody rated them yet.
    pub async fn get_coach_average_rating(&self, email: &str) -> Result<u8> {
        let coach = self.get_user(email).await?;
        Ok(average_rating(&coach)?)
    }

    /// Puts `contact` at the front of a user's chat contacts unless already
    /// present, and shows the chat in the current user's cached contact list.
    /// Returns whether the contact was added.
    pub async fn add_chat_contact_if_new(
        &self,
        email: &str,
        chat_id: &str,
        contact: &str,
    ) -> Result<bool> {
        let _guard = self.rmw.lock().await;
        self.add_chat_contact(email, chat_id, contact).await
    }

    /// Body of [`Self::add_chat_contact_if_new`] for callers already holding `rmw`.
    pub(super) async fn add_chat_contact(
        &self,
        email: &str,
        chat_id: &str,
        contact: &str,
    ) -> Result<bool> {
        let user = self.get_user(email).await?;
        let Some(updated) = prepend_chat_contact(&user, contact) else {
            return Ok(false);
        };
        self.update_user(&updated).await?;
        self.refresh_contact_row(chat_id, Some(contact), None).await;

        tracing::debug!(email = %email, contact = %contact, "Chat contact added");
        Ok(true)
    }
}
