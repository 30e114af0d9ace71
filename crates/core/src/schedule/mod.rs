mod error;
mod operations;
mod types;

pub use error::ScheduleError;
pub use operations::{
    events_in_window, group_events_of_user, register_participant, sort_group_events_by_date,
    upcoming_group_events, week_monday, SCHEDULE_WEEKS_AHEAD, SCHEDULE_WEEKS_BEHIND,
};
pub use types::{GroupEvent, Schedule, ScheduleWindow};
