//! In-memory cache backend implementation.
//!
//! Provides a thread-safe in-memory cache with TTL support and pub/sub
//! for a single application session.

mod cache;
mod pubsub;

pub use cache::MemoryCache;
pub use pubsub::{MemoryPubSub, DEFAULT_CHANNEL_CAPACITY};
