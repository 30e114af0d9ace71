//! Read-through caching store decorator.
//!
//! `CachingStore` wraps any `RemoteStore` with caching behavior and
//! implements the same store traits, so callers cannot tell it apart from
//! the backend it wraps:
//!
//! - **Reads**: Check cache first, on miss fetch from the remote store and populate cache
//! - **Writes**: Evict, persist remotely, repopulate on success, publish chat updates
//!
//! The current user's schedule is kept apart from the byte cache, as a
//! window of weeks around the displayed week.
//!
//! # Example
//!
//! ```ignore
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//!
//! let remote = Arc::new(InMemoryStore::new());
//! let cache = Arc::new(MemoryCache::new(NonZeroUsize::new(10_000).unwrap()));
//! let pubsub = Arc::new(MemoryPubSub::new());
//!
//! let store = CachingStore::new(remote, cache, pubsub, None);
//! let user = store.get_user("ada@example.com").await?;
//! ```

mod chats;
mod contacts;
mod group_events;
mod schedule;
mod store;
mod tokens;
mod users;

#[cfg(test)]
mod mock;

pub use store::CachingStore;
