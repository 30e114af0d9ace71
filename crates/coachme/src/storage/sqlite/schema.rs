//! SQLite schema definitions and SQL query constants.
//!
//! Each record is stored as one JSON document keyed by its primary key, the
//! same shape the hosted document store uses.

/// Session key holding the current user's email.
pub const CURRENT_EMAIL_KEY: &str = "current_email";

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    email TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chats (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS push_tokens (
    email TEXT PRIMARY KEY,
    token TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_events (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schedules (
    email TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

// User queries
pub const UPSERT_USER: &str = r#"
INSERT INTO users (email, document, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(email) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at
"#;

pub const SELECT_USER: &str = r#"
SELECT document
FROM users
WHERE email = ?1
"#;

pub const SELECT_ALL_USERS: &str = r#"
SELECT document
FROM users
ORDER BY email ASC
"#;

pub const USER_EXISTS: &str = r#"
SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)
"#;

// Chat queries
pub const UPSERT_CHAT: &str = r#"
INSERT INTO chats (id, document, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at
"#;

pub const SELECT_CHAT: &str = r#"
SELECT document
FROM chats
WHERE id = ?1
"#;

// Push token queries
pub const UPSERT_PUSH_TOKEN: &str = r#"
INSERT INTO push_tokens (email, token, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(email) DO UPDATE SET token = excluded.token, updated_at = excluded.updated_at
"#;

pub const SELECT_PUSH_TOKEN: &str = r#"
SELECT token
FROM push_tokens
WHERE email = ?1
"#;

// Group event queries
pub const UPSERT_GROUP_EVENT: &str = r#"
INSERT INTO group_events (id, document, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at
"#;

pub const SELECT_GROUP_EVENT: &str = r#"
SELECT document
FROM group_events
WHERE id = ?1
"#;

pub const SELECT_ALL_GROUP_EVENTS: &str = r#"
SELECT document
FROM group_events
ORDER BY id ASC
"#;

// Schedule queries
pub const UPSERT_SCHEDULE: &str = r#"
INSERT INTO schedules (email, document, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(email) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at
"#;

pub const SELECT_SCHEDULE: &str = r#"
SELECT document
FROM schedules
WHERE email = ?1
"#;

// Session queries
pub const UPSERT_SESSION_VALUE: &str = r#"
INSERT INTO session (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#;

pub const SELECT_SESSION_VALUE: &str = r#"
SELECT value
FROM session
WHERE key = ?1
"#;
