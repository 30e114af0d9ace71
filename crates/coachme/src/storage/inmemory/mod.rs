//! In-memory storage backend.
//!
//! This module provides an in-memory implementation of the store traits
//! that keeps all data in HashMaps wrapped in `Arc<RwLock<_>>`. This is the
//! default backend and the one used for development and seeding.
//!
//! # Example
//!
//! ```rust,ignore
//! use coachme::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! store.update_user(&user).await?;
//! ```

mod store;

pub use store::InMemoryStore;
