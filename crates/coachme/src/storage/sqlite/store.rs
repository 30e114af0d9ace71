//! SQLite remote store implementation.
//!
//! Implements the store traits from `coachme_core::storage` using SQLite.

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use coachme_core::messaging::{mark_other_users_messages_as_read, Chat, Message};
use coachme_core::schedule::{GroupEvent, Schedule};
use coachme_core::storage::{
    ChatStore, GroupEventStore, PushTokenStore, Result, ScheduleStore, SessionStore, StoreError,
    UserStore,
};
use coachme_core::user::{Event, UserInfo};

use super::conversions::{
    from_document, now_timestamp, row_to_chat, row_to_group_event, row_to_user, to_document,
};
use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based store implementation.
///
/// Provides async access to SQLite storage for users, chats, push tokens,
/// group events, schedules and the session identity.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new store with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Transport(format!("Cannot open {path}: {e}")))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new store with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))
    }

    /// Stores a whole chat, replacing any chat with the same id.
    pub async fn insert_chat(&self, chat: &Chat) -> Result<()> {
        let chat_id = chat.id.clone();
        let document = to_document(chat)
            .map_err(|e| StoreError::Serialization(format!("Chat {chat_id}: {e}")))?;

        let id = chat_id.clone();
        self.conn
            .call(move |conn| {
                conn.execute(schema::UPSERT_CHAT, rusqlite::params![id, document, now_timestamp()])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Chat", &chat_id))
    }

    /// Loads a chat, applies `change` and writes it back in one transaction.
    async fn modify_chat<F>(&self, chat_id: &str, change: F) -> Result<()>
    where
        F: FnOnce(Chat) -> Chat + Send + 'static,
    {
        let id = chat_id.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let document: String = tx
                    .query_row(schema::SELECT_CHAT, [&id], |row| row.get(0))
                    .map_err(wrap_err)?;
                let chat: Chat = from_document(&document).map_err(wrap_err)?;

                let updated = to_document(&change(chat)).map_err(wrap_err)?;
                tx.execute(schema::UPSERT_CHAT, rusqlite::params![id, updated, now_timestamp()])
                    .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Chat", chat_id))
    }

    /// Loads a user's schedule (empty when absent), applies `change` and
    /// writes it back in one transaction.
    async fn modify_schedule<F>(&self, email: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut Schedule) + Send + 'static,
    {
        let key = email.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let existing: Option<String> = tx
                    .query_row(schema::SELECT_SCHEDULE, [&key], |row| row.get(0))
                    .optional()
                    .map_err(wrap_err)?;
                let mut schedule = match existing {
                    Some(document) => from_document::<Schedule>(&document).map_err(wrap_err)?,
                    None => Schedule::default(),
                };
                change(&mut schedule);

                let document = to_document(&schedule).map_err(wrap_err)?;
                tx.execute(
                    schema::UPSERT_SCHEDULE,
                    rusqlite::params![key, document, now_timestamp()],
                )
                .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Schedule", email))
    }
}

// ============================================================================
// UserStore implementation
// ============================================================================

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, email: &str) -> Result<UserInfo> {
        let key = email.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_USER).map_err(wrap_err)?;
                let user = stmt.query_row([&key], row_to_user).map_err(wrap_err)?;
                Ok(user)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", email))
    }

    async fn update_user(&self, user: &UserInfo) -> Result<()> {
        let email = user.email.clone();
        let document = to_document(user)
            .map_err(|e| StoreError::Serialization(format!("User {email}: {e}")))?;

        let key = email.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::UPSERT_USER,
                    rusqlite::params![key, document, now_timestamp()],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", &email))
    }

    async fn get_all_users(&self) -> Result<Vec<UserInfo>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_USERS).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_user).map_err(wrap_err)?;

                let mut users = Vec::new();
                for row_result in rows {
                    users.push(row_result.map_err(wrap_err)?);
                }
                Ok(users)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", "*"))
    }

    async fn user_exists(&self, email: &str) -> Result<bool> {
        let key = email.to_string();
        self.conn
            .call(move |conn| {
                let exists: bool = conn
                    .query_row(schema::USER_EXISTS, [&key], |row| row.get(0))
                    .map_err(wrap_err)?;
                Ok(exists)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User", email))
    }
}

// ============================================================================
// ChatStore implementation
// ============================================================================

#[async_trait]
impl ChatStore for SqliteStore {
    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        let id = chat_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_CHAT).map_err(wrap_err)?;
                let chat = stmt.query_row([&id], row_to_chat).map_err(wrap_err)?;
                Ok(chat)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Chat", chat_id))
    }

    async fn update_chat_participants(&self, chat_id: &str, participants: &[String]) -> Result<()> {
        let id = chat_id.to_string();
        let participants = participants.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let existing: Option<String> = tx
                    .query_row(schema::SELECT_CHAT, [&id], |row| row.get(0))
                    .optional()
                    .map_err(wrap_err)?;
                let mut chat = match existing {
                    Some(document) => from_document::<Chat>(&document).map_err(wrap_err)?,
                    None => Chat::new(id.clone(), Vec::new()),
                };
                chat.participants = participants;

                let document = to_document(&chat).map_err(wrap_err)?;
                tx.execute(schema::UPSERT_CHAT, rusqlite::params![id, document, now_timestamp()])
                    .map_err(wrap_err)?;

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Chat", chat_id))
    }

    async fn send_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        let message = message.clone();
        self.modify_chat(chat_id, move |mut chat| {
            chat.messages.push(message);
            chat
        })
        .await
    }

    async fn mark_messages_as_read(&self, chat_id: &str, email: &str) -> Result<()> {
        let viewer = email.to_string();
        self.modify_chat(chat_id, move |chat| {
            mark_other_users_messages_as_read(&chat, &viewer)
        })
        .await
    }
}

// ============================================================================
// PushTokenStore implementation
// ============================================================================

#[async_trait]
impl PushTokenStore for SqliteStore {
    async fn get_push_token(&self, email: &str) -> Result<String> {
        let key = email.to_string();
        self.conn
            .call(move |conn| {
                let token: String = conn
                    .query_row(schema::SELECT_PUSH_TOKEN, [&key], |row| row.get(0))
                    .map_err(wrap_err)?;
                Ok(token)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "PushToken", email))
    }

    async fn set_push_token(&self, email: &str, token: &str) -> Result<()> {
        let key = email.to_string();
        let token = token.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::UPSERT_PUSH_TOKEN,
                    rusqlite::params![key, token, now_timestamp()],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "PushToken", email))
    }
}

// ============================================================================
// GroupEventStore implementation
// ============================================================================

#[async_trait]
impl GroupEventStore for SqliteStore {
    async fn get_group_event(&self, group_event_id: &str) -> Result<GroupEvent> {
        let id = group_event_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_GROUP_EVENT).map_err(wrap_err)?;
                let group_event = stmt.query_row([&id], row_to_group_event).map_err(wrap_err)?;
                Ok(group_event)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "GroupEvent", group_event_id))
    }

    async fn get_all_group_events(&self) -> Result<Vec<GroupEvent>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_ALL_GROUP_EVENTS)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_group_event).map_err(wrap_err)?;

                let mut group_events = Vec::new();
                for row_result in rows {
                    group_events.push(row_result.map_err(wrap_err)?);
                }
                Ok(group_events)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "GroupEvent", "*"))
    }

    async fn update_group_event(&self, group_event: &GroupEvent) -> Result<()> {
        let group_event_id = group_event.group_event_id.clone();
        let document = to_document(group_event).map_err(|e| {
            StoreError::Serialization(format!("GroupEvent {group_event_id}: {e}"))
        })?;

        let id = group_event_id.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::UPSERT_GROUP_EVENT,
                    rusqlite::params![id, document, now_timestamp()],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "GroupEvent", &group_event_id))
    }
}

// ============================================================================
// ScheduleStore implementation
// ============================================================================

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn get_schedule(&self, email: &str) -> Result<Schedule> {
        let key = email.to_string();
        self.conn
            .call(move |conn| {
                let document: Option<String> = conn
                    .query_row(schema::SELECT_SCHEDULE, [&key], |row| row.get(0))
                    .optional()
                    .map_err(wrap_err)?;
                match document {
                    Some(document) => Ok(from_document(&document).map_err(wrap_err)?),
                    None => Ok(Schedule::default()),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Schedule", email))
    }

    async fn add_event_to_schedule(&self, email: &str, event: &Event) -> Result<()> {
        let event = event.clone();
        self.modify_schedule(email, move |schedule| schedule.events.push(event))
            .await
    }

    async fn add_group_event_to_schedule(&self, email: &str, group_event_id: &str) -> Result<()> {
        let id = group_event_id.to_string();
        self.modify_schedule(email, move |schedule| {
            if !schedule.group_events.contains(&id) {
                schedule.group_events.push(id);
            }
        })
        .await
    }
}

// ============================================================================
// SessionStore implementation
// ============================================================================

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_current_email(&self) -> Result<String> {
        let current = self
            .conn
            .call(|conn| {
                let value: Option<String> = conn
                    .query_row(
                        schema::SELECT_SESSION_VALUE,
                        [schema::CURRENT_EMAIL_KEY],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(wrap_err)?;
                Ok(value)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Session", schema::CURRENT_EMAIL_KEY))?;

        current
            .filter(|email| !email.is_empty())
            .ok_or(StoreError::NoCurrentUser)
    }

    async fn set_current_email(&self, email: &str) -> Result<()> {
        let value = email.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::UPSERT_SESSION_VALUE,
                    rusqlite::params![schema::CURRENT_EMAIL_KEY, value],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Session", schema::CURRENT_EMAIL_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use coachme_core::messaging::ReadState;
    use coachme_core::user::{Address, Sport};

    fn yoga() -> GroupEvent {
        let event = Event::new("Yoga", "#00ff00", at("2024-03-04 10:00"), at("2024-03-04 11:00"));
        GroupEvent::new(event, "ada@example.com", 2)
    }

    async fn setup_store() -> SqliteStore {
        SqliteStore::new_in_memory().await.unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn coach() -> UserInfo {
        UserInfo::new("Ada", "Lovelace", "ada@example.com")
            .as_coach()
            .with_sports([Sport::Ski, Sport::Tennis])
            .with_address(Address::new("place-lausanne", "Lausanne", 46.52, 6.63))
    }

    // ==================== User Tests ====================

    #[tokio::test]
    async fn test_user_roundtrip() {
        let store = setup_store().await;

        store.update_user(&coach()).await.unwrap();

        assert_eq!(store.get_user("ada@example.com").await.unwrap(), coach());
        assert!(store.user_exists("ada@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_user_missing_is_not_found() {
        let store = setup_store().await;

        let err = store.get_user("ghost@example.com").await.unwrap_err();

        assert_eq!(err, StoreError::not_found("User", "ghost@example.com"));
        assert!(!store.user_exists("ghost@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user_replaces_document() {
        let store = setup_store().await;
        store.update_user(&coach()).await.unwrap();

        let updated = coach().with_phone("+41 79 000 00 00");
        store.update_user(&updated).await.unwrap();

        let users = store.get_all_users().await.unwrap();
        assert_eq!(users, vec![updated]);
    }

    #[tokio::test]
    async fn test_get_all_users_sorted_by_email() {
        let store = setup_store().await;
        store
            .update_user(&UserInfo::new("Zed", "Z", "zed@example.com"))
            .await
            .unwrap();
        store.update_user(&coach()).await.unwrap();

        let users = store.get_all_users().await.unwrap();
        let emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();

        assert_eq!(emails, vec!["ada@example.com", "zed@example.com"]);
    }

    // ==================== Chat Tests ====================

    #[tokio::test]
    async fn test_update_participants_creates_chat() {
        let store = setup_store().await;
        let participants = vec!["a@x.com".to_string(), "b@x.com".to_string()];

        store
            .update_chat_participants("a@x.comb@x.com", &participants)
            .await
            .unwrap();

        let chat = store.get_chat("a@x.comb@x.com").await.unwrap();
        assert_eq!(chat.participants, participants);
        assert!(chat.messages.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_appends() {
        let store = setup_store().await;
        store.insert_chat(&Chat::personal("a@x.com", "b@x.com")).await.unwrap();
        let chat_id = Chat::personal("a@x.com", "b@x.com").id;

        let message = Message::new("a@x.com", "hello", at("2024-03-01 10:00"));
        store.send_message(&chat_id, &message).await.unwrap();

        let chat = store.get_chat(&chat_id).await.unwrap();
        assert_eq!(chat.messages, vec![message]);
    }

    #[tokio::test]
    async fn test_send_message_to_missing_chat_is_not_found() {
        let store = setup_store().await;
        let message = Message::new("a@x.com", "hello", at("2024-03-01 10:00"));

        let err = store.send_message("nope", &message).await.unwrap_err();

        assert_eq!(err, StoreError::not_found("Chat", "nope"));
    }

    #[tokio::test]
    async fn test_mark_messages_as_read_persists() {
        let store = setup_store().await;
        let chat = Chat::personal("alice@x.com", "bob@x.com").with_messages(vec![Message::new(
            "alice@x.com",
            "hi",
            at("2024-03-01 10:00"),
        )]);
        store.insert_chat(&chat).await.unwrap();

        store.mark_messages_as_read(&chat.id, "bob@x.com").await.unwrap();

        let stored = store.get_chat(&chat.id).await.unwrap();
        assert_eq!(stored.messages[0].read_state, ReadState::Read);
        assert_eq!(stored.messages[0].read_by_users.get("bob@x,com"), Some(&true));
    }

    // ==================== Token and Session Tests ====================

    #[tokio::test]
    async fn test_push_token_roundtrip() {
        let store = setup_store().await;

        store.set_push_token("ada@example.com", "tok-1").await.unwrap();
        store.set_push_token("ada@example.com", "tok-2").await.unwrap();

        assert_eq!(store.get_push_token("ada@example.com").await.unwrap(), "tok-2");
        assert!(store
            .get_push_token("ghost@example.com")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_current_email() {
        let store = setup_store().await;

        assert_eq!(
            store.get_current_email().await.unwrap_err(),
            StoreError::NoCurrentUser
        );

        store.set_current_email("ada@example.com").await.unwrap();
        assert_eq!(store.get_current_email().await.unwrap(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_empty_current_email_is_no_current_user() {
        let store = setup_store().await;

        store.set_current_email("").await.unwrap();

        assert_eq!(
            store.get_current_email().await.unwrap_err(),
            StoreError::NoCurrentUser
        );
    }

    // ==================== Group Event and Schedule Tests ====================

    #[tokio::test]
    async fn test_group_event_roundtrip() {
        let store = setup_store().await;
        let group_event = yoga();

        assert!(store
            .get_group_event(&group_event.group_event_id)
            .await
            .unwrap_err()
            .is_not_found());

        store.update_group_event(&group_event).await.unwrap();
        let joined = group_event
            .clone()
            .with_participants(vec!["bob@example.com".to_string()]);
        store.update_group_event(&joined).await.unwrap();

        assert_eq!(
            store.get_group_event(&group_event.group_event_id).await.unwrap(),
            joined
        );
        assert_eq!(store.get_all_group_events().await.unwrap(), vec![joined]);
    }

    #[tokio::test]
    async fn test_schedule_accumulates_in_place() {
        let store = setup_store().await;
        assert_eq!(
            store.get_schedule("bob@example.com").await.unwrap(),
            Schedule::default()
        );

        let group_event = yoga();
        let run = Event::new("Run", "#0000ff", at("2024-03-05 07:00"), at("2024-03-05 08:00"));
        store.add_event_to_schedule("bob@example.com", &run).await.unwrap();
        store
            .add_group_event_to_schedule("bob@example.com", &group_event.group_event_id)
            .await
            .unwrap();
        store
            .add_group_event_to_schedule("bob@example.com", &group_event.group_event_id)
            .await
            .unwrap();

        let schedule = store.get_schedule("bob@example.com").await.unwrap();
        assert_eq!(schedule.events, vec![run]);
        assert_eq!(schedule.group_events, vec![group_event.group_event_id]);
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let dir = std::env::temp_dir().join(format!(
            "coachme-sqlite-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.db");
        let path_str = path.to_str().unwrap();
        let _ = std::fs::remove_file(&path);

        {
            let store = SqliteStore::new(path_str).await.unwrap();
            store.update_user(&coach()).await.unwrap();
        }

        let reopened = SqliteStore::new(path_str).await.unwrap();
        assert_eq!(reopened.get_user("ada@example.com").await.unwrap(), coach());

        let _ = std::fs::remove_file(&path);
    }
}
