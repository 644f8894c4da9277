use std::sync::Arc;

use chrono::Utc;
use huddle_db::Db;
use huddle_db::models::Message;
use uuid::Uuid;

use super::base::{PaginatedResult, PaginationParams, StoreError, StoreResult};

pub struct MessageRepo {
    db: Arc<Db>,
}

impl MessageRepo {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, message: Message) -> StoreResult<Message> {
        let mut messages = self.db.messages.write();
        messages.insert(message.id, message.clone());
        Ok(message)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Message> {
        self.db
            .messages
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// One page of a channel's stream in reverse commit order (newest page
    /// first). Callers re-reverse page items for chronological reading.
    pub async fn find_in_channel(
        &self,
        channel_id: Uuid,
        params: &PaginationParams,
    ) -> StoreResult<PaginatedResult<Message>> {
        let messages = self.db.messages.read();

        let mut in_channel: Vec<Message> = messages
            .values()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        in_channel.sort_by(|a, b| b.seq.cmp(&a.seq));

        let total = in_channel.len() as u64;
        let per_page = params.per_page.max(1);
        let skip = ((params.page.max(1) - 1) * per_page) as usize;
        let items: Vec<Message> = in_channel
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .collect();
        let total_pages = total.div_ceil(per_page);

        Ok(PaginatedResult {
            items,
            total,
            page: params.page.max(1),
            per_page,
            total_pages,
        })
    }

    pub async fn update_content(&self, id: Uuid, content: String) -> StoreResult<Message> {
        let mut messages = self.db.messages.write();
        let message = messages.get_mut(&id).ok_or(StoreError::NotFound)?;
        message.content = content;
        message.edited_at = Some(Utc::now());
        Ok(message.clone())
    }

    /// Hard delete — no tombstone.
    pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.db.messages.write().remove(&id).is_some())
    }

    /// The channel's latest remaining message, for last-message pointer
    /// repair after a delete.
    pub async fn latest_in_channel(&self, channel_id: Uuid) -> StoreResult<Option<Message>> {
        Ok(self
            .db
            .messages
            .read()
            .values()
            .filter(|m| m.channel_id == channel_id)
            .max_by_key(|m| m.seq)
            .cloned())
    }
}
