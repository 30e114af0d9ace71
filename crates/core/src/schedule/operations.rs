use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use crate::user::Event;

use super::error::ScheduleError;
use super::types::{GroupEvent, ScheduleWindow};

/// Weeks kept in memory before the displayed week.
pub const SCHEDULE_WEEKS_BEHIND: u64 = 4;
/// Weeks kept in memory after the displayed week.
pub const SCHEDULE_WEEKS_AHEAD: u64 = 4;

/// Returns the Monday starting the week of `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Sorts group events by start time. Events starting together keep their order.
pub fn sort_group_events_by_date(mut group_events: Vec<GroupEvent>) -> Vec<GroupEvent> {
    group_events.sort_by_key(|group_event| group_event.event.start);
    group_events
}

/// Keeps the group events starting strictly after `now`.
pub fn upcoming_group_events(group_events: Vec<GroupEvent>, now: NaiveDateTime) -> Vec<GroupEvent> {
    group_events
        .into_iter()
        .filter(|group_event| group_event.event.start > now)
        .collect()
}

/// Keeps the group events `email` organizes or takes part in.
pub fn group_events_of_user(group_events: Vec<GroupEvent>, email: &str) -> Vec<GroupEvent> {
    group_events
        .into_iter()
        .filter(|group_event| group_event.involves(email))
        .collect()
}

/// Returns a copy of `group_event` with `email` registered as a participant.
///
/// # Errors
///
/// Fails when the event is already full or `email` is already registered.
pub fn register_participant(
    group_event: &GroupEvent,
    email: &str,
) -> Result<GroupEvent, ScheduleError> {
    if group_event.participants.iter().any(|p| p == email) {
        return Err(ScheduleError::AlreadyRegistered {
            id: group_event.group_event_id.clone(),
            email: email.to_string(),
        });
    }
    if group_event.is_full() {
        return Err(ScheduleError::GroupEventFull {
            id: group_event.group_event_id.clone(),
            max: group_event.max_participants,
        });
    }

    let mut updated = group_event.clone();
    updated.participants.push(email.to_string());
    Ok(updated)
}

/// The events lying inside `window`, in their original order.
pub fn events_in_window(events: &[Event], window: &ScheduleWindow) -> Vec<Event> {
    events
        .iter()
        .filter(|event| window.holds(event))
        .cloned()
        .collect()
}
