use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::messaging::GROUP_CHAT_PREFIX;
use crate::user::Event;

use super::operations::{SCHEDULE_WEEKS_AHEAD, SCHEDULE_WEEKS_BEHIND};

/// An event organized by a coach that several users can join.
///
/// The id doubles as the id of the event's group chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEvent {
    pub group_event_id: String,
    pub event: Event,
    /// Email of the organizing coach.
    pub organizer: String,
    pub max_participants: usize,
    /// Emails of the registered users, in registration order.
    #[serde(default)]
    pub participants: Vec<String>,
}

impl GroupEvent {
    /// Creates a group event nobody has joined yet.
    ///
    /// The id is derived from the organizer and the start time, so one coach
    /// cannot open two group events starting at the same minute.
    pub fn new(event: Event, organizer: impl Into<String>, max_participants: usize) -> Self {
        let organizer = organizer.into();
        let group_event_id = format!(
            "{GROUP_CHAT_PREFIX}{organizer}{}",
            event.start.format("%Y-%m-%dT%H:%M")
        );

        Self {
            group_event_id,
            event,
            organizer,
            max_participants,
            participants: Vec::new(),
        }
    }

    pub fn with_participants(mut self, participants: Vec<String>) -> Self {
        self.participants = participants;
        self
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants
    }

    /// Returns true if `email` organizes or takes part in the event.
    pub fn involves(&self, email: &str) -> bool {
        self.organizer == email || self.participants.iter().any(|p| p == email)
    }

    /// Members of the event's group chat: the organizer, then the participants.
    pub fn chat_participants(&self) -> Vec<String> {
        let mut members = vec![self.organizer.clone()];
        members.extend(
            self.participants
                .iter()
                .filter(|p| **p != self.organizer)
                .cloned(),
        );
        members
    }
}

/// A user's planned events and the group events they joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub events: Vec<Event>,
    /// Ids of joined group events.
    #[serde(default)]
    pub group_events: Vec<String>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.group_events.is_empty()
    }
}

/// The weeks of a schedule kept in memory, bounded by two Mondays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub min_monday: NaiveDate,
    pub max_monday: NaiveDate,
}

impl ScheduleWindow {
    /// The window spanning four weeks before and after `monday`.
    pub fn around(monday: NaiveDate) -> Self {
        Self {
            min_monday: monday
                .checked_sub_days(Days::new(7 * SCHEDULE_WEEKS_BEHIND))
                .unwrap_or(NaiveDate::MIN),
            max_monday: monday
                .checked_add_days(Days::new(7 * SCHEDULE_WEEKS_AHEAD))
                .unwrap_or(NaiveDate::MAX),
        }
    }

    /// Whether a fetched event lies inside the window, both ends inclusive.
    pub fn holds(&self, event: &Event) -> bool {
        event.start.date() >= self.min_monday && event.end.date() <= self.max_monday
    }

    /// Whether a newly added event joins the in-memory copy.
    ///
    /// An event ending on the last Monday is left out.
    pub fn admits(&self, event: &Event) -> bool {
        event.start.date() >= self.min_monday && event.end.date() < self.max_monday
    }

    /// Whether showing the week of `monday` needs a fresh window.
    pub fn needs_refetch(&self, monday: NaiveDate) -> bool {
        monday <= self.min_monday || monday >= self.max_monday
    }
}
