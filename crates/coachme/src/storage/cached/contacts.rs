//! Contact list of the caching store.
//!
//! The rows shown in a user's contact list are cached per email. They are
//! built from the user's chat contacts on a miss and kept in step with new
//! messages and new contacts without refetching.

use coachme_core::cache::{contact_rows_key, Cache, CachePubSub};
use coachme_core::messaging::{
    bump_contact_row, chat_id_for_contact, is_group_chat_id, other_participant, ContactRowInfo,
    Message,
};
use coachme_core::storage::{
    ChatStore, GroupEventStore, RemoteStore, Result, SessionStore, StoreError, UserStore,
};

use super::CachingStore;

impl<R, C, P> CachingStore<R, C, P>
where
    R: RemoteStore + 'static,
    C: Cache + 'static,
    P: CachePubSub + 'static,
{
    /// Gets the contact list of `email`, most recent chat first.
    ///
    /// A chat nobody wrote in yet has no last message.
    pub async fn get_contact_row_infos(&self, email: &str) -> Result<Vec<ContactRowInfo>> {
        let cache_key = contact_rows_key(email);

        if let Some(rows) = self.cache_get::<Vec<ContactRowInfo>>(&cache_key).await {
            return Ok(rows);
        }

        let user = self.get_user(email).await?;
        let mut rows = Vec::with_capacity(user.chat_contacts.len());
        for contact in &user.chat_contacts {
            rows.push(self.contact_row(email, contact).await?);
        }

        let _guard = self.contact_rows.lock().await;
        self.cache_put(&cache_key, &rows).await;
        Ok(rows)
    }

    /// Builds the row `owner` sees for `contact`.
    async fn contact_row(&self, owner: &str, contact: &str) -> Result<ContactRowInfo> {
        let chat_id = chat_id_for_contact(owner, contact);
        let is_group_chat = is_group_chat_id(&chat_id);

        let last_message = match self.get_chat(&chat_id).await {
            Ok(chat) => chat.messages.last().cloned(),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };

        let chat_title = if is_group_chat {
            self.get_group_event(&chat_id).await?.event.name
        } else {
            self.get_user(contact).await?.full_name()
        };

        Ok(ContactRowInfo {
            chat_id,
            chat_title,
            last_message,
            is_group_chat,
        })
    }

    /// Moves the row of `chat_id` to the front of the current user's cached
    /// contact list, with `message` as its latest message when given.
    ///
    /// Nothing happens unless that list is cached. A chat missing from the
    /// list gets a new row, built for `contact` or, when unknown, for the
    /// chat's other participant. If the row cannot be built the list is
    /// evicted and rebuilt on the next read.
    pub(super) async fn refresh_contact_row(
        &self,
        chat_id: &str,
        contact: Option<&str>,
        message: Option<&Message>,
    ) {
        let owner = match self.get_current_email().await {
            Ok(owner) => owner,
            Err(err) => {
                tracing::trace!(chat_id = %chat_id, error = %err, "No contact list to refresh");
                return;
            }
        };
        let cache_key = contact_rows_key(&owner);

        let _guard = self.contact_rows.lock().await;
        let Some(rows) = self.cache_get::<Vec<ContactRowInfo>>(&cache_key).await else {
            return;
        };

        if let Some(updated) = bump_contact_row(&rows, chat_id, message) {
            self.cache_put(&cache_key, &updated).await;
            return;
        }

        match self.new_contact_row(&owner, chat_id, contact).await {
            Ok(mut row) => {
                if let Some(message) = message {
                    row.last_message = Some(message.clone());
                }
                let mut updated = Vec::with_capacity(rows.len() + 1);
                updated.push(row);
                updated.extend(rows);
                self.cache_put(&cache_key, &updated).await;
                tracing::debug!(owner = %owner, chat_id = %chat_id, "Contact row added");
            }
            Err(err) => {
                tracing::warn!(chat_id = %chat_id, error = %err, "Cannot build contact row, list evicted");
                self.cache_evict(&cache_key).await;
            }
        }
    }

    async fn new_contact_row(
        &self,
        owner: &str,
        chat_id: &str,
        contact: Option<&str>,
    ) -> Result<ContactRowInfo> {
        if let Some(contact) = contact {
            return self.contact_row(owner, contact).await;
        }
        if is_group_chat_id(chat_id) {
            return self.contact_row(owner, chat_id).await;
        }

        let chat = self.get_chat(chat_id).await?;
        match other_participant(&chat, owner) {
            Some(contact) => self.contact_row(owner, contact).await,
            None => Err(StoreError::InvalidData(format!(
                "Chat {chat_id} has no participant besides {owner}"
            ))),
        }
    }
}
