use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sports a user can practice or coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sport {
    Ski,
    Tennis,
    Running,
    Swimming,
    Workout,
}

/// A resolved place attached to a user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub place_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Address {
    pub fn new(
        place_id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// A scheduled event on a user's agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    /// Display color (CSS color value).
    pub color: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub description: String,
}

impl Event {
    /// Creates a new event without a description.
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            start,
            end,
            description: String::new(),
        }
    }

    /// Sets the description for this event.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A user record, keyed by `email`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub coach: bool,
    #[serde(default)]
    pub sports: Vec<Sport>,
    #[serde(default)]
    pub events: Vec<Event>,
    /// Identifiers of the chats or contacts this user talks to, most recent first.
    #[serde(default)]
    pub chat_contacts: Vec<String>,
    /// Ratings received as a coach, keyed by the rater's normalized email.
    #[serde(default)]
    pub ratings: BTreeMap<String, u8>,
}

impl UserInfo {
    /// Creates a user with the given names and email and every other field empty.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Marks this user as a coach.
    pub fn as_coach(mut self) -> Self {
        self.coach = true;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Sets the sports for this user, dropping duplicates while keeping order.
    pub fn with_sports(mut self, sports: impl IntoIterator<Item = Sport>) -> Self {
        self.sports.clear();
        for sport in sports {
            if !self.sports.contains(&sport) {
                self.sports.push(sport);
            }
        }
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    /// Returns "First Last", used as a chat title.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
