//! Seed data loading.
//!
//! Fills a freshly opened backend with records read from a JSON file of the
//! form `{ "users": [...], "chats": [...], "group_events": [...],
//! "schedules": { "<email>": {...} } }`. Every section is optional.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coachme_core::messaging::Chat;
use coachme_core::schedule::{GroupEvent, Schedule};
use coachme_core::storage::{GroupEventStore, ScheduleStore, StoreError, UserStore};
use coachme_core::user::UserInfo;

use crate::storage::Backend;

/// Errors that can occur while seeding a backend.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid seed file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records written to the backend before the first command runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<UserInfo>,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub group_events: Vec<GroupEvent>,
    /// Schedules keyed by owner email.
    #[serde(default)]
    pub schedules: BTreeMap<String, Schedule>,
}

/// Reads seed data from a JSON file.
pub fn load_seed(path: &Path) -> Result<SeedData, SeedError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes every seeded record to the backend, bypassing the cache.
pub async fn apply_seed(backend: &Backend, seed: &SeedData) -> Result<(), SeedError> {
    for user in &seed.users {
        backend.update_user(user).await?;
    }
    for chat in &seed.chats {
        backend.insert_chat(chat).await?;
    }
    for group_event in &seed.group_events {
        backend.update_group_event(group_event).await?;
    }
    for (email, schedule) in &seed.schedules {
        for event in &schedule.events {
            backend.add_event_to_schedule(email, event).await?;
        }
        for group_event_id in &schedule.group_events {
            backend.add_group_event_to_schedule(email, group_event_id).await?;
        }
    }

    tracing::info!(
        users = seed.users.len(),
        chats = seed.chats.len(),
        group_events = seed.group_events.len(),
        schedules = seed.schedules.len(),
        "Backend seeded"
    );
    Ok(())
}
