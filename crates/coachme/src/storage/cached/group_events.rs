//! Group event operations of the caching store.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use coachme_core::cache::{encode, group_event_key, Cache, CachePubSub, GROUP_EVENTS_PATTERN};
use coachme_core::schedule::{
    group_events_of_user, register_participant, sort_group_events_by_date, upcoming_group_events,
    GroupEvent,
};
use coachme_core::storage::{ChatStore, GroupEventStore, RemoteStore, Result, SessionStore};

use super::CachingStore;

#[async_trait]
impl<R, C, P> GroupEventStore for CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    async fn get_group_event(&self, group_event_id: &str) -> Result<GroupEvent> {
        let cache_key = group_event_key(group_event_id);

        if let Some(group_event) = self.cache_get::<GroupEvent>(&cache_key).await {
            return Ok(group_event);
        }

        let group_event = self.remote.get_group_event(group_event_id).await?;
        self.cache_put(&cache_key, &group_event).await;

        Ok(group_event)
    }

    async fn get_all_group_events(&self) -> Result<Vec<GroupEvent>> {
        let group_events = self.remote.get_all_group_events().await?;

        let mut entries = Vec::with_capacity(group_events.len());
        for group_event in &group_events {
            match encode(group_event) {
                Ok(bytes) => entries.push((group_event_key(&group_event.group_event_id), bytes)),
                Err(err) => {
                    tracing::warn!(id = %group_event.group_event_id, error = %err, "Failed to serialize group event for cache");
                }
            }
        }

        if let Err(err) = self
            .cache
            .replace_pattern(GROUP_EVENTS_PATTERN, entries, self.ttl)
            .await
        {
            tracing::warn!(error = %err, "Failed to refresh group event cache");
        }

        Ok(group_events)
    }

    async fn update_group_event(&self, group_event: &GroupEvent) -> Result<()> {
        let cache_key = group_event_key(&group_event.group_event_id);

        self.cache_evict(&cache_key).await;

        if let Err(err) = self.remote.update_group_event(group_event).await {
            tracing::warn!(id = %group_event.group_event_id, error = %err, "Group event update failed, cache evicted");
            return Err(err);
        }

        self.cache_put(&cache_key, group_event).await;

        tracing::debug!(id = %group_event.group_event_id, "Group event updated");
        Ok(())
    }
}

impl<R, C, P> CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    /// Every group event, earliest first.
    pub async fn get_all_group_events_by_date(&self) -> Result<Vec<GroupEvent>> {
        let group_events = self.get_all_group_events().await?;
        Ok(sort_group_events_by_date(group_events))
    }

    /// Group events that have not started yet, earliest first.
    pub async fn get_upcoming_group_events_by_date(&self) -> Result<Vec<GroupEvent>> {
        self.get_upcoming_group_events_at(Local::now().naive_local())
            .await
    }

    async fn get_upcoming_group_events_at(&self, now: NaiveDateTime) -> Result<Vec<GroupEvent>> {
        let group_events = self.get_all_group_events_by_date().await?;
        Ok(upcoming_group_events(group_events, now))
    }

    /// Group events `email` organizes or joined, earliest first.
    pub async fn get_group_events_of_user_by_date(&self, email: &str) -> Result<Vec<GroupEvent>> {
        let group_events = self.get_all_group_events_by_date().await?;
        Ok(group_events_of_user(group_events, email))
    }

    /// Registers the current user for a group event.
    ///
    /// The user is added to the event's participants, the event to the
    /// user's schedule, the user to the event's group chat, and the chat to
    /// the user's contacts. Fails with `InvalidData` when the event is full
    /// or the user already joined it.
    pub async fn register_for_group_event(&self, group_event_id: &str) -> Result<GroupEvent> {
        let _guard = self.rmw.lock().await;

        let email = self.get_current_email().await?;
        let group_event = self.get_group_event(group_event_id).await?;
        let updated = register_participant(&group_event, &email)?;

        self.update_group_event(&updated).await?;
        self.add_group_event_to_schedule(group_event_id).await?;
        self.update_chat_participants(group_event_id, &updated.chat_participants())
            .await?;
        self.add_chat_contact(&email, group_event_id, group_event_id)
            .await?;

        tracing::info!(id = %group_event_id, email = %email, "Registered for group event");
        Ok(updated)
    }
}
