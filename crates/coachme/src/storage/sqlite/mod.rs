//! SQLite storage backend implementation.
//!
//! This module provides a SQLite-based implementation of the store traits
//! using `rusqlite` for synchronous operations and `tokio-rusqlite` for async
//! wrapping. Records are kept as JSON documents so the backend mirrors the
//! hosted document store the app talks to in production.

mod conversions;
mod error;
mod schema;
mod store;

pub use store::SqliteStore;
