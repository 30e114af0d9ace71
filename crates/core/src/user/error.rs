use thiserror::Error;

/// Errors raised by user-level validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("User is not a coach: {0}")]
    NotACoach(String),
    #[error("Rating must be between 0 and {max}, got {rating}")]
    RatingOutOfRange { rating: u8, max: u8 },
}
