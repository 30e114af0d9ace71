//! In-memory remote store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use coachme_core::messaging::{mark_other_users_messages_as_read, Chat, Message};
use coachme_core::schedule::{GroupEvent, Schedule};
use coachme_core::storage::{
    ChatStore, GroupEventStore, PushTokenStore, Result, ScheduleStore, SessionStore, StoreError,
    UserStore,
};
use coachme_core::user::{Event, UserInfo};

/// In-memory stand-in for the hosted document store.
///
/// Uses HashMaps wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Data is not persisted and will be lost when the store is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, UserInfo>>>,
    chats: Arc<RwLock<HashMap<String, Chat>>>,
    push_tokens: Arc<RwLock<HashMap<String, String>>>,
    group_events: Arc<RwLock<HashMap<String, GroupEvent>>>,
    schedules: Arc<RwLock<HashMap<String, Schedule>>>,
    current_email: Arc<RwLock<Option<String>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            chats: Arc::new(RwLock::new(HashMap::new())),
            push_tokens: Arc::new(RwLock::new(HashMap::new())),
            group_events: Arc::new(RwLock::new(HashMap::new())),
            schedules: Arc::new(RwLock::new(HashMap::new())),
            current_email: Arc::new(RwLock::new(None)),
        }
    }

    /// Stores a whole chat, replacing any chat with the same id.
    pub async fn insert_chat(&self, chat: &Chat) -> Result<()> {
        let mut chats = self.chats.write().await;
        chats.insert(chat.id.clone(), chat.clone());
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, email: &str) -> Result<UserInfo> {
        let users = self.users.read().await;
        users
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User", email))
    }

    async fn update_user(&self, user: &UserInfo) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn get_all_users(&self) -> Result<Vec<UserInfo>> {
        let users = self.users.read().await;
        let mut all: Vec<UserInfo> = users.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    async fn user_exists(&self, email: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users.contains_key(email))
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        let chats = self.chats.read().await;
        chats
            .get(chat_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Chat", chat_id))
    }

    async fn update_chat_participants(&self, chat_id: &str, participants: &[String]) -> Result<()> {
        let mut chats = self.chats.write().await;
        chats
            .entry(chat_id.to_string())
            .or_insert_with(|| Chat::new(chat_id, Vec::new()))
            .participants = participants.to_vec();
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::not_found("Chat", chat_id))?;
        chat.messages.push(message.clone());
        Ok(())
    }

    async fn mark_messages_as_read(&self, chat_id: &str, email: &str) -> Result<()> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::not_found("Chat", chat_id))?;
        *chat = mark_other_users_messages_as_read(chat, email);
        Ok(())
    }
}

#[async_trait]
impl PushTokenStore for InMemoryStore {
    async fn get_push_token(&self, email: &str) -> Result<String> {
        let tokens = self.push_tokens.read().await;
        tokens
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("PushToken", email))
    }

    async fn set_push_token(&self, email: &str, token: &str) -> Result<()> {
        let mut tokens = self.push_tokens.write().await;
        tokens.insert(email.to_string(), token.to_string());
        Ok(())
    }
}

#[async_trait]
impl GroupEventStore for InMemoryStore {
    async fn get_group_event(&self, group_event_id: &str) -> Result<GroupEvent> {
        let group_events = self.group_events.read().await;
        group_events
            .get(group_event_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("GroupEvent", group_event_id))
    }

    async fn get_all_group_events(&self) -> Result<Vec<GroupEvent>> {
        let group_events = self.group_events.read().await;
        let mut all: Vec<GroupEvent> = group_events.values().cloned().collect();
        all.sort_by(|a, b| a.group_event_id.cmp(&b.group_event_id));
        Ok(all)
    }

    async fn update_group_event(&self, group_event: &GroupEvent) -> Result<()> {
        let mut group_events = self.group_events.write().await;
        group_events.insert(group_event.group_event_id.clone(), group_event.clone());
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn get_schedule(&self, email: &str) -> Result<Schedule> {
        let schedules = self.schedules.read().await;
        Ok(schedules.get(email).cloned().unwrap_or_default())
    }

    async fn add_event_to_schedule(&self, email: &str, event: &Event) -> Result<()> {
        let mut schedules = self.schedules.write().await;
        schedules
            .entry(email.to_string())
            .or_default()
            .events
            .push(event.clone());
        Ok(())
    }

    async fn add_group_event_to_schedule(&self, email: &str, group_event_id: &str) -> Result<()> {
        let mut schedules = self.schedules.write().await;
        let schedule = schedules.entry(email.to_string()).or_default();
        if !schedule.group_events.iter().any(|id| id == group_event_id) {
            schedule.group_events.push(group_event_id.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get_current_email(&self) -> Result<String> {
        let current = self.current_email.read().await;
        current
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or(StoreError::NoCurrentUser)
    }

    async fn set_current_email(&self, email: &str) -> Result<()> {
        let mut current = self.current_email.write().await;
        *current = Some(email.to_string());
        Ok(())
    }
}
