//! Cache backend implementations.
//!
//! Concrete implementations of the cache traits defined in
//! `coachme_core::cache`. Only the in-process backend exists: the cache
//! lives and dies with one application session.

pub mod memory;

pub use memory::{MemoryCache, MemoryPubSub, DEFAULT_CHANNEL_CAPACITY};
