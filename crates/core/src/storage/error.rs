use thiserror::Error;

use crate::schedule::ScheduleError;
use crate::user::UserError;

/// Errors that can occur during remote store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Transport failed: {0}")]
    Transport(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("No current user is set")]
    NoCurrentUser,
}

impl StoreError {
    /// Shorthand for a missing record.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Returns true if the error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<UserError> for StoreError {
    fn from(err: UserError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

impl From<ScheduleError> for StoreError {
    fn from(err: ScheduleError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
