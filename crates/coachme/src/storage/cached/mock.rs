//! Test doubles shared by the caching store tests.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, RwLock};

use coachme_core::cache::{Cache, CacheError, Result as CacheResult};
use coachme_core::messaging::{mark_other_users_messages_as_read, Chat, Message};
use coachme_core::schedule::{GroupEvent, Schedule};
use coachme_core::storage::{
    ChatStore, GroupEventStore, PushTokenStore, Result, ScheduleStore, SessionStore, StoreError,
    UserStore,
};
use coachme_core::user::{Event, UserInfo};

use crate::cache::{MemoryCache, MemoryPubSub};

use super::CachingStore;

// Mock remote store that tracks calls
#[derive(Default)]
pub struct MockRemote {
    users: RwLock<HashMap<String, UserInfo>>,
    chats: RwLock<HashMap<String, Chat>>,
    tokens: RwLock<HashMap<String, String>>,
    group_events: RwLock<HashMap<String, GroupEvent>>,
    schedules: RwLock<HashMap<String, Schedule>>,
    current_email: RwLock<Option<String>>,
    send_gate: Mutex<Option<SendGate>>,
    pub get_user_calls: AtomicUsize,
    pub get_all_calls: AtomicUsize,
    pub user_exists_calls: AtomicUsize,
    pub get_chat_calls: AtomicUsize,
    pub chat_write_calls: AtomicUsize,
    pub get_token_calls: AtomicUsize,
    pub get_group_event_calls: AtomicUsize,
    pub get_schedule_calls: AtomicUsize,
    pub fail_writes: AtomicBool,
}

// Parks the next send_message until released
#[derive(Clone, Default)]
pub struct SendGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserInfo) {
        self.users.write().await.insert(user.email.clone(), user);
    }

    pub async fn remove_user(&self, email: &str) {
        self.users.write().await.remove(email);
    }

    pub async fn insert_chat(&self, chat: Chat) {
        self.chats.write().await.insert(chat.id.clone(), chat);
    }

    pub async fn stored_chat(&self, chat_id: &str) -> Option<Chat> {
        self.chats.read().await.get(chat_id).cloned()
    }

    pub async fn stored_user(&self, email: &str) -> Option<UserInfo> {
        self.users.read().await.get(email).cloned()
    }

    pub async fn insert_group_event(&self, group_event: GroupEvent) {
        self.group_events
            .write()
            .await
            .insert(group_event.group_event_id.clone(), group_event);
    }

    pub async fn stored_group_event(&self, group_event_id: &str) -> Option<GroupEvent> {
        self.group_events.read().await.get(group_event_id).cloned()
    }

    pub async fn stored_schedule(&self, email: &str) -> Schedule {
        self.schedules
            .read()
            .await
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn hold_next_send(&self) -> SendGate {
        let gate = SendGate::default();
        *self.send_gate.lock().await = Some(gate.clone());
        gate
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("remote unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MockRemote {
    async fn get_user(&self, email: &str) -> Result<UserInfo> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;
        self.users
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User", email))
    }

    async fn update_user(&self, user: &UserInfo) -> Result<()> {
        tokio::task::yield_now().await;
        self.check_write()?;
        self.users
            .write()
            .await
            .insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn get_all_users(&self) -> Result<Vec<UserInfo>> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);
        let mut users: Vec<UserInfo> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn user_exists(&self, email: &str) -> Result<bool> {
        self.user_exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.read().await.contains_key(email))
    }
}

#[async_trait]
impl ChatStore for MockRemote {
    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        self.get_chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chats
            .read()
            .await
            .get(chat_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Chat", chat_id))
    }

    async fn update_chat_participants(&self, chat_id: &str, participants: &[String]) -> Result<()> {
        self.chat_write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.chats
            .write()
            .await
            .entry(chat_id.to_string())
            .or_insert_with(|| Chat::new(chat_id, Vec::new()))
            .participants = participants.to_vec();
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        self.chat_write_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.send_gate.lock().await.take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.check_write()?;
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::not_found("Chat", chat_id))?;
        chat.messages.push(message.clone());
        Ok(())
    }

    async fn mark_messages_as_read(&self, chat_id: &str, email: &str) -> Result<()> {
        self.chat_write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::not_found("Chat", chat_id))?;
        *chat = mark_other_users_messages_as_read(chat, email);
        Ok(())
    }
}

#[async_trait]
impl PushTokenStore for MockRemote {
    async fn get_push_token(&self, email: &str) -> Result<String> {
        self.get_token_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("PushToken", email))
    }

    async fn set_push_token(&self, email: &str, token: &str) -> Result<()> {
        self.check_write()?;
        self.tokens
            .write()
            .await
            .insert(email.to_string(), token.to_string());
        Ok(())
    }
}

#[async_trait]
impl GroupEventStore for MockRemote {
    async fn get_group_event(&self, group_event_id: &str) -> Result<GroupEvent> {
        self.get_group_event_calls.fetch_add(1, Ordering::SeqCst);
        self.group_events
            .read()
            .await
            .get(group_event_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("GroupEvent", group_event_id))
    }

    async fn get_all_group_events(&self) -> Result<Vec<GroupEvent>> {
        let mut group_events: Vec<GroupEvent> =
            self.group_events.read().await.values().cloned().collect();
        group_events.sort_by(|a, b| a.group_event_id.cmp(&b.group_event_id));
        Ok(group_events)
    }

    async fn update_group_event(&self, group_event: &GroupEvent) -> Result<()> {
        self.check_write()?;
        self.insert_group_event(group_event.clone()).await;
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for MockRemote {
    async fn get_schedule(&self, email: &str) -> Result<Schedule> {
        self.get_schedule_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stored_schedule(email).await)
    }

    async fn add_event_to_schedule(&self, email: &str, event: &Event) -> Result<()> {
        self.check_write()?;
        self.schedules
            .write()
            .await
            .entry(email.to_string())
            .or_default()
            .events
            .push(event.clone());
        Ok(())
    }

    async fn add_group_event_to_schedule(&self, email: &str, group_event_id: &str) -> Result<()> {
        self.check_write()?;
        let mut schedules = self.schedules.write().await;
        let schedule = schedules.entry(email.to_string()).or_default();
        if !schedule.group_events.iter().any(|id| id == group_event_id) {
            schedule.group_events.push(group_event_id.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MockRemote {
    async fn get_current_email(&self) -> Result<String> {
        self.current_email
            .read()
            .await
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or(StoreError::NoCurrentUser)
    }

    async fn set_current_email(&self, email: &str) -> Result<()> {
        *self.current_email.write().await = Some(email.to_string());
        Ok(())
    }
}

// Cache whose every operation fails
pub struct BrokenCache;

#[async_trait]
impl Cache for BrokenCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::Unavailable("broken".to_string()))
    }

    async fn contains(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Unavailable("broken".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::Unavailable("broken".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable("broken".to_string()))
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable("broken".to_string()))
    }

    async fn replace_pattern(
        &self,
        _pattern: &str,
        _entries: Vec<(String, Vec<u8>)>,
        _ttl: Option<Duration>,
    ) -> CacheResult<()> {
        Err(CacheError::Unavailable("broken".to_string()))
    }
}

pub type TestStore = CachingStore<MockRemote, MemoryCache, MemoryPubSub>;

pub fn caching_store(remote: Arc<MockRemote>) -> TestStore {
    let cache = Arc::new(MemoryCache::new(NonZeroUsize::new(1000).unwrap()));
    let pubsub = Arc::new(MemoryPubSub::new());
    CachingStore::new(remote, cache, pubsub, None)
}
