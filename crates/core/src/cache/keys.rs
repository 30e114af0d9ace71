/// Pattern matching every cached user.
pub const USERS_PATTERN: &str = "user:*";

/// Returns the cache key for a user.
pub fn user_key(email: &str) -> String {
    format!("user:{email}")
}

/// Returns the cache key for a chat.
pub fn chat_key(chat_id: &str) -> String {
    format!("chat:{chat_id}")
}

/// Returns the cache key for a user's push token.
pub fn push_token_key(email: &str) -> String {
    format!("token:{email}")
}

/// Pattern matching every cached group event.
pub const GROUP_EVENTS_PATTERN: &str = "group_event:*";

pub fn group_event_key(group_event_id: &str) -> String {
    format!("group_event:{group_event_id}")
}

/// Returns the cache key for the contact list shown to a user.
pub fn contact_rows_key(email: &str) -> String {
    format!("contacts:{email}")
}
