//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `StoreError` from
//! `coachme_core::storage`.

use coachme_core::storage::StoreError;

/// Maps a rusqlite error to a StoreError.
///
/// # Error Mapping
///
/// - No rows → `StoreError::NotFound`
/// - Document (de)serialization failures → `StoreError::Serialization`
/// - Everything else → `StoreError::Transport`
fn map_rusqlite_error(err: &rusqlite::Error, entity_type: &'static str, id: &str) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::not_found(entity_type, id),

        rusqlite::Error::FromSqlConversionFailure(_, _, source)
        | rusqlite::Error::ToSqlConversionFailure(source) => {
            StoreError::Serialization(format!("{entity_type} {id}: {source}"))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            StoreError::Transport(format!("Cannot open database: {err}"))
        }

        _ => StoreError::Transport(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a StoreError for the record `id`.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
    id: &str,
) -> StoreError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type, id)
        }
        tokio_rusqlite::Error::Close(_) | tokio_rusqlite::Error::ConnectionClosed => {
            StoreError::Transport("Connection closed unexpectedly".to_string())
        }
        _ => StoreError::Transport(err.to_string()),
    }
}
