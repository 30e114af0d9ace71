mod error;
mod operations;
mod types;

pub use error::UserError;
pub use operations::{
    add_rating, append_events, average_rating, distance_meters, prepend_chat_contact,
    sort_users_by_distance, MAX_RATING,
};
pub use types::{Address, Event, Sport, UserInfo};
