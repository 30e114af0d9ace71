mod operations;
mod types;

pub use operations::{
    bump_contact_row, chat_id_for_contact, chat_id_for_personal_chats, is_group_chat_id,
    mark_other_users_messages_as_read, other_participant, GROUP_CHAT_PREFIX,
};
pub use types::{Chat, ContactRowInfo, Message, ReadState};
