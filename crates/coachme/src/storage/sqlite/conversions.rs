//! SQLite row conversion functions.
//!
//! Pure functions for converting between stored JSON documents and domain
//! types. Testable in isolation without database access.

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

use coachme_core::messaging::Chat;
use coachme_core::schedule::GroupEvent;
use coachme_core::user::UserInfo;

/// Serializes a record to the JSON document stored in its row.
pub fn to_document<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Parses a JSON document read from a row.
pub fn from_document<T: DeserializeOwned>(json: &str) -> rusqlite::Result<T> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Convert a SQLite row to a UserInfo.
///
/// Expected columns: document
pub fn row_to_user(row: &Row) -> rusqlite::Result<UserInfo> {
    let document: String = row.get(0)?;
    from_document(&document)
}

/// Convert a SQLite row to a Chat.
///
/// Expected columns: document
pub fn row_to_chat(row: &Row) -> rusqlite::Result<Chat> {
    let document: String = row.get(0)?;
    from_document(&document)
}

/// Convert a SQLite row to a GroupEvent.
///
/// Expected columns: document
pub fn row_to_group_event(row: &Row) -> rusqlite::Result<GroupEvent> {
    let document: String = row.get(0)?;
    from_document(&document)
}

/// Timestamp written to `updated_at` columns.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
