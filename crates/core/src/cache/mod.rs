mod error;
mod keys;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    chat_key, contact_rows_key, group_event_key, push_token_key, user_key, GROUP_EVENTS_PATTERN,
    USERS_PATTERN,
};
pub use patterns::pattern_matches;
pub use serialization::{decode, encode, SerializationError};
pub use traits::{Cache, CachePubSub};
