use thiserror::Error;

/// Errors raised by group event rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Group event {id} is full ({max} participants)")]
    GroupEventFull { id: String, max: usize },
    #[error("{email} is already registered for group event {id}")]
    AlreadyRegistered { id: String, email: String },
}
