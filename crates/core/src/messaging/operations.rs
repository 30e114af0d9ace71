use crate::storage::normalize_email_key;

use super::types::{Chat, ContactRowInfo, Message, ReadState};

/// Prefix of the ids of group event chats.
pub const GROUP_CHAT_PREFIX: &str = "@@event";

/// Returns true if `chat_id` names the chat of a group event.
pub fn is_group_chat_id(chat_id: &str) -> bool {
    chat_id.starts_with(GROUP_CHAT_PREFIX)
}

/// Returns the id of the one-to-one chat between two users.
///
/// The smaller email (lexicographically) comes first, so both participants
/// derive the same id whatever the argument order.
pub fn chat_id_for_personal_chats(email1: &str, email2: &str) -> String {
    if email1 < email2 {
        format!("{email1}{email2}")
    } else {
        format!("{email2}{email1}")
    }
}

/// Returns the chat `owner` has with `contact`.
///
/// A group event contact is its own chat id; any other contact is a user
/// sharing a personal chat with the owner.
pub fn chat_id_for_contact(owner: &str, contact: &str) -> String {
    if is_group_chat_id(contact) {
        contact.to_string()
    } else {
        chat_id_for_personal_chats(owner, contact)
    }
}

/// The first participant of `chat` who is not `viewer`.
pub fn other_participant<'a>(chat: &'a Chat, viewer: &str) -> Option<&'a str> {
    chat.participants
        .iter()
        .map(String::as_str)
        .find(|participant| *participant != viewer)
}

/// Moves the row of `chat_id` to the front of `rows`.
///
/// When `message` is given it becomes the row's latest message. Returns
/// `None` if no row belongs to the chat.
pub fn bump_contact_row(
    rows: &[ContactRowInfo],
    chat_id: &str,
    message: Option<&Message>,
) -> Option<Vec<ContactRowInfo>> {
    let position = rows.iter().position(|row| row.chat_id == chat_id)?;

    let mut bumped = rows[position].clone();
    if let Some(message) = message {
        bumped.last_message = Some(message.clone());
    }

    let mut updated = Vec::with_capacity(rows.len());
    updated.push(bumped);
    updated.extend(
        rows.iter()
            .enumerate()
            .filter(|(index, _)| *index != position)
            .map(|(_, row)| row.clone()),
    );
    Some(updated)
}

/// Marks every message of `chat` not sent by `viewer` as read by `viewer`.
///
/// A message is promoted to [`ReadState::Read`] once every participant other
/// than its sender has read it. Messages already read, sent by the viewer,
/// or already carrying the viewer's mark are returned unchanged, which makes
/// the operation idempotent.
pub fn mark_other_users_messages_as_read(chat: &Chat, viewer: &str) -> Chat {
    let viewer_key = normalize_email_key(viewer);
    let readers_needed = chat.participants.len().saturating_sub(1);

    let messages = chat
        .messages
        .iter()
        .map(|message| mark_read_by(message, viewer, &viewer_key, readers_needed))
        .collect();

    Chat {
        id: chat.id.clone(),
        participants: chat.participants.clone(),
        messages,
    }
}

fn mark_read_by(message: &Message, viewer: &str, viewer_key: &str, readers_needed: usize) -> Message {
    if message.read_state == ReadState::Read
        || message.sender == viewer
        || message.read_by_users.contains_key(viewer)
        || message.read_by_users.contains_key(viewer_key)
    {
        return message.clone();
    }

    let mut updated = message.clone();
    updated.read_by_users.insert(viewer_key.to_string(), true);
    if updated.read_count() == readers_needed {
        updated.read_state = ReadState::Read;
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::collections::BTreeMap;

    const ALICE: &str = "alice@x.com";
    const BOB: &str = "bob@x.com";
    const CAROL: &str = "carol@x.com";

    fn message(sender: &str, state: ReadState) -> Message {
        Message::new(sender, "Hello, I would like to book a session", NaiveDateTime::default())
            .with_read_state(state)
    }

    fn two_party_chat(messages: Vec<Message>) -> Chat {
        Chat::personal(ALICE, BOB).with_messages(messages)
    }

    #[test]
    fn test_chat_id_is_symmetric() {
        assert_eq!(
            chat_id_for_personal_chats(ALICE, BOB),
            chat_id_for_personal_chats(BOB, ALICE)
        );
        assert_eq!(chat_id_for_personal_chats(ALICE, BOB), "alice@x.combob@x.com");
    }

    #[test]
    fn test_chat_id_same_email_twice() {
        assert_eq!(chat_id_for_personal_chats(ALICE, ALICE), "alice@x.comalice@x.com");
    }

    #[test]
    fn test_two_party_sent_message_becomes_read() {
        let chat = two_party_chat(vec![message(ALICE, ReadState::Sent)]);

        let updated = mark_other_users_messages_as_read(&chat, BOB);

        let msg = &updated.messages[0];
        assert_eq!(msg.read_state, ReadState::Read);
        assert_eq!(
            msg.read_by_users,
            BTreeMap::from([("bob@x,com".to_string(), true)])
        );
    }

    #[test]
    fn test_is_idempotent() {
        let chat = two_party_chat(vec![message(ALICE, ReadState::Sent)]);

        let once = mark_other_users_messages_as_read(&chat, BOB);
        let twice = mark_other_users_messages_as_read(&once, BOB);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_is_idempotent_in_group_chat() {
        let chat = Chat::new("group", vec![ALICE.into(), BOB.into(), CAROL.into()])
            .with_messages(vec![message(ALICE, ReadState::Sent)]);

        let once = mark_other_users_messages_as_read(&chat, BOB);
        let twice = mark_other_users_messages_as_read(&once, BOB);

        assert_eq!(once, twice);
        assert_eq!(twice.messages[0].read_by_users.len(), 1);
    }

    #[test]
    fn test_own_messages_untouched() {
        let chat = two_party_chat(vec![message(BOB, ReadState::Sent)]);

        let updated = mark_other_users_messages_as_read(&chat, BOB);

        assert_eq!(updated, chat);
    }

    #[test]
    fn test_read_messages_untouched() {
        let chat = two_party_chat(vec![message(ALICE, ReadState::Read)]);

        let updated = mark_other_users_messages_as_read(&chat, BOB);

        assert!(updated.messages[0].read_by_users.is_empty());
    }

    #[test]
    fn test_group_chat_needs_every_other_participant() {
        let chat = Chat::new("group", vec![ALICE.into(), BOB.into(), CAROL.into()])
            .with_messages(vec![message(ALICE, ReadState::Received)]);

        let after_bob = mark_other_users_messages_as_read(&chat, BOB);
        assert_eq!(after_bob.messages[0].read_state, ReadState::Received);

        let after_carol = mark_other_users_messages_as_read(&after_bob, CAROL);
        assert_eq!(after_carol.messages[0].read_state, ReadState::Read);
        assert_eq!(after_carol.messages[0].read_count(), 2);
    }

    #[test]
    fn test_preserves_order_and_length() {
        let chat = two_party_chat(vec![
            message(ALICE, ReadState::Read),
            message(BOB, ReadState::Read),
            message(ALICE, ReadState::Received),
            message(BOB, ReadState::Received),
            message(BOB, ReadState::Sent),
            message(ALICE, ReadState::Sent),
        ]);

        let updated = mark_other_users_messages_as_read(&chat, ALICE);

        assert_eq!(updated.messages.len(), chat.messages.len());
        for (before, after) in chat.messages.iter().zip(&updated.messages) {
            assert_eq!(before.sender, after.sender);
            if after.sender == BOB {
                assert_eq!(after.read_state, ReadState::Read);
            } else {
                assert_eq!(after, before);
            }
        }
    }

    fn row(chat_id: &str) -> ContactRowInfo {
        ContactRowInfo {
            chat_id: chat_id.to_string(),
            chat_title: chat_id.to_uppercase(),
            ..ContactRowInfo::default()
        }
    }

    #[test]
    fn test_chat_id_for_contact() {
        assert_eq!(chat_id_for_contact(BOB, ALICE), "alice@x.combob@x.com");
        assert_eq!(
            chat_id_for_contact(BOB, "@@eventalice@x.com2024-03-04T10:00"),
            "@@eventalice@x.com2024-03-04T10:00"
        );
    }

    #[test]
    fn test_other_participant() {
        let chat = Chat::personal(ALICE, BOB);
        assert_eq!(other_participant(&chat, ALICE), Some(BOB));
        assert_eq!(other_participant(&chat, BOB), Some(ALICE));
        assert_eq!(other_participant(&Chat::new("solo", vec![ALICE.into()]), ALICE), None);
    }

    #[test]
    fn test_bump_contact_row_moves_to_front_with_message() {
        let rows = vec![row("c1"), row("c2"), row("c3")];
        let latest = message(ALICE, ReadState::Sent);

        let bumped = bump_contact_row(&rows, "c3", Some(&latest)).unwrap();

        let ids: Vec<&str> = bumped.iter().map(|r| r.chat_id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
        assert_eq!(bumped[0].last_message, Some(latest));
        assert_eq!(bumped[1], rows[0]);
    }

    #[test]
    fn test_bump_contact_row_without_message_keeps_last_message() {
        let mut rows = vec![row("c1"), row("c2")];
        rows[1].last_message = Some(message(BOB, ReadState::Read));

        let bumped = bump_contact_row(&rows, "c2", None).unwrap();

        assert_eq!(bumped[0], rows[1]);
    }

    #[test]
    fn test_bump_unknown_contact_row() {
        assert_eq!(bump_contact_row(&[row("c1")], "c9", None), None);
    }

    #[test]
    fn test_empty_chat() {
        let chat = Chat::new("empty", vec![]);
        assert_eq!(mark_other_users_messages_as_read(&chat, BOB), chat);
    }
}
