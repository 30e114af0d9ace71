//! CoachMe data layer.
//!
//! A read-through caching store in front of a swappable remote store,
//! together with the seed loader used by the `coachme` binary.

pub mod cache;
pub mod config;
pub mod seed;
pub mod storage;
