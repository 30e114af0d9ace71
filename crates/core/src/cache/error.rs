use thiserror::Error;

use super::serialization::SerializationError;

/// Why a cache could not serve a request.
///
/// The caching store logs these and falls back to the remote store, so
/// they never reach a caller of a store operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backing cache refused or lost the request.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
    /// A cached record could not be turned into or read back from bytes.
    #[error("Cached record codec failed: {0}")]
    Codec(#[from] SerializationError),
}

pub type Result<T> = std::result::Result<T, CacheError>;
