//! Core types, storage contracts and pure operations for the coachme data layer.
//!
//! Everything in this crate is free of I/O: domain records live in [`user`],
//! [`messaging`] and [`schedule`], the async backend contracts in [`storage`]
//! and the byte-level cache contracts in [`cache`]. Concrete backends and the
//! caching decorator live in the `coachme` crate.

pub mod cache;
pub mod messaging;
pub mod schedule;
pub mod storage;
pub mod user;
