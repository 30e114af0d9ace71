mod error;
mod keys;
mod traits;

pub use error::{Result, StoreError};
pub use keys::normalize_email_key;
pub use traits::{
    ChatStore, GroupEventStore, PushTokenStore, RemoteStore, ScheduleStore, SessionStore,
    UserStore,
};
