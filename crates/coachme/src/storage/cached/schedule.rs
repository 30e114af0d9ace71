//! Schedule operations of the caching store.
//!
//! Only the current user's schedule is kept, restricted to a window of
//! weeks around the displayed week. Moving the displayed week onto or past
//! either edge of the window refetches the schedule around the new week.

use chrono::NaiveDate;

use coachme_core::cache::{Cache, CachePubSub};
use coachme_core::schedule::{events_in_window, week_monday, Schedule, ScheduleWindow};
use coachme_core::storage::{GroupEventStore, RemoteStore, Result, ScheduleStore, SessionStore};
use coachme_core::user::Event;

use super::CachingStore;

/// The schedule held in memory, with whose it is and which weeks it covers.
#[derive(Debug, Default)]
pub(super) struct ScheduleCache {
    owner: Option<String>,
    schedule: Schedule,
    window: Option<ScheduleWindow>,
}

impl ScheduleCache {
    /// The window, if the cached schedule belongs to `email`.
    fn window_of(&self, email: &str) -> Option<ScheduleWindow> {
        match self.owner.as_deref() {
            Some(owner) if owner == email => self.window,
            _ => None,
        }
    }
}

impl<R, C, P> CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    /// Gets the current user's schedule for the weeks around `date`.
    ///
    /// The cached copy is served while the week of `date` lies strictly
    /// inside its window. An empty cached schedule is always refetched.
    pub async fn get_schedule(&self, date: NaiveDate) -> Result<Schedule> {
        let email = self.get_current_email().await?;
        let monday = week_monday(date);

        let mut cached = self.schedule.lock().await;
        if let Some(window) = cached.window_of(&email) {
            if !cached.schedule.is_empty() && !window.needs_refetch(monday) {
                tracing::trace!(email = %email, %monday, "Schedule cache hit");
                return Ok(cached.schedule.clone());
            }
        }

        let window = ScheduleWindow::around(monday);
        let schedule = self.fetch_schedule(&email, &window).await?;
        tracing::debug!(
            email = %email,
            from = %window.min_monday,
            to = %window.max_monday,
            events = schedule.events.len(),
            "Schedule fetched"
        );

        *cached = ScheduleCache {
            owner: Some(email),
            schedule: schedule.clone(),
            window: Some(window),
        };
        Ok(schedule)
    }

    /// Adds an event to the current user's schedule.
    ///
    /// The cached copy only gains the event if it falls inside the window.
    /// Returns the cached schedule, empty when none is cached for the user.
    pub async fn add_event_to_schedule(&self, event: &Event) -> Result<Schedule> {
        let email = self.get_current_email().await?;
        self.remote.add_event_to_schedule(&email, event).await?;

        let mut cached = self.schedule.lock().await;
        let Some(window) = cached.window_of(&email) else {
            return Ok(Schedule::default());
        };
        if window.admits(event) {
            cached.schedule.events.push(event.clone());
        }
        Ok(cached.schedule.clone())
    }

    /// Adds a group event to the current user's schedule.
    ///
    /// Returns the cached schedule, empty when none is cached for the user.
    pub async fn add_group_event_to_schedule(&self, group_event_id: &str) -> Result<Schedule> {
        let email = self.get_current_email().await?;
        self.remote
            .add_group_event_to_schedule(&email, group_event_id)
            .await?;
        let group_event = self.get_group_event(group_event_id).await?;

        let mut cached = self.schedule.lock().await;
        let Some(window) = cached.window_of(&email) else {
            return Ok(Schedule::default());
        };
        if cached.schedule.group_events.iter().any(|id| id == group_event_id) {
            return Ok(cached.schedule.clone());
        }
        cached.schedule.group_events.push(group_event_id.to_string());
        if window.admits(&group_event.event) {
            cached.schedule.events.push(group_event.event);
        }
        Ok(cached.schedule.clone())
    }

    /// Loads a schedule, keeping its own events and the events of its group
    /// events that lie inside `window`.
    async fn fetch_schedule(&self, email: &str, window: &ScheduleWindow) -> Result<Schedule> {
        let stored = self.remote.get_schedule(email).await?;
        let mut events = events_in_window(&stored.events, window);

        for group_event_id in &stored.group_events {
            match self.get_group_event(group_event_id).await {
                Ok(group_event) if window.holds(&group_event.event) => {
                    events.push(group_event.event)
                }
                Ok(_) => {}
                Err(err) if err.is_not_found() => {
                    tracing::warn!(email = %email, id = %group_event_id, "Scheduled group event no longer exists");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Schedule {
            events,
            group_events: stored.group_events,
        })
    }
}
