use async_trait::async_trait;

use crate::messaging::{Chat, Message};
use crate::schedule::{GroupEvent, Schedule};
use crate::user::{Event, UserInfo};

use super::Result;

/// Store for user records, keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Gets a user by email. Fails with `NotFound` when absent.
    async fn get_user(&self, email: &str) -> Result<UserInfo>;

    /// Creates or replaces the user stored under `user.email`.
    async fn update_user(&self, user: &UserInfo) -> Result<()>;

    /// Lists every user.
    async fn get_all_users(&self) -> Result<Vec<UserInfo>>;

    /// Checks whether a user exists.
    async fn user_exists(&self, email: &str) -> Result<bool>;
}

/// Store for chats and their messages.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Gets a chat by id. Fails with `NotFound` when absent.
    async fn get_chat(&self, chat_id: &str) -> Result<Chat>;

    /// Sets the participants of a chat, creating the chat if it does not exist.
    async fn update_chat_participants(&self, chat_id: &str, participants: &[String]) -> Result<()>;

    /// Appends a message to an existing chat.
    async fn send_message(&self, chat_id: &str, message: &Message) -> Result<()>;

    /// Marks the messages of a chat as read by `email`.
    async fn mark_messages_as_read(&self, chat_id: &str, email: &str) -> Result<()>;
}

/// Store for push notification tokens.
#[async_trait]
pub trait PushTokenStore: Send + Sync {
    /// Gets the push token registered for a user.
    async fn get_push_token(&self, email: &str) -> Result<String>;

    /// Registers the push token for a user.
    async fn set_push_token(&self, email: &str, token: &str) -> Result<()>;
}

/// Store for group events, keyed by group event id.
#[async_trait]
pub trait GroupEventStore: Send + Sync {
    /// Gets a group event by id. Fails with `NotFound` when absent.
    async fn get_group_event(&self, group_event_id: &str) -> Result<GroupEvent>;

    /// Lists every group event.
    async fn get_all_group_events(&self) -> Result<Vec<GroupEvent>>;

    /// Creates or replaces the group event stored under its id.
    async fn update_group_event(&self, group_event: &GroupEvent) -> Result<()>;
}

/// Store for users' schedules, keyed by email.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Gets the schedule of a user. A user without one has an empty schedule.
    async fn get_schedule(&self, email: &str) -> Result<Schedule>;

    /// Appends an event to a user's schedule.
    async fn add_event_to_schedule(&self, email: &str, event: &Event) -> Result<()>;

    /// Records that a user joined a group event. Adding the same id twice is a no-op.
    async fn add_group_event_to_schedule(&self, email: &str, group_event_id: &str) -> Result<()>;
}

/// Identity of the user the current session acts as.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Gets the current email. Fails with `NoCurrentUser` when unset or empty.
    async fn get_current_email(&self) -> Result<String>;

    async fn set_current_email(&self, email: &str) -> Result<()>;
}

/// Combined trait for backends that provide every store.
pub trait RemoteStore:
    UserStore + ChatStore + PushTokenStore + GroupEventStore + ScheduleStore + SessionStore
{
}

impl<T> RemoteStore for T where
    T: UserStore + ChatStore + PushTokenStore + GroupEventStore + ScheduleStore + SessionStore
{
}
