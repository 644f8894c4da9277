use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use huddle_db::Db;
use huddle_db::models::{Reaction, ReactionGroup};
use uuid::Uuid;

use super::base::StoreResult;

pub struct ReactionRepo {
    db: Arc<Db>,
}

impl ReactionRepo {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Insert-or-remove on the unique (message, user, emoji) triple.
    /// Returns true when the reaction was added, false when removed.
    pub async fn toggle(
        &self,
        message_id: Uuid,
        channel_id: Uuid,
        user_id: Uuid,
        emoji: &str,
    ) -> StoreResult<bool> {
        let mut reactions = self.db.reactions.write();
        let key = (message_id, user_id, emoji.to_string());

        if reactions.remove(&key).is_some() {
            return Ok(false);
        }

        reactions.insert(
            key,
            Reaction {
                message_id,
                channel_id,
                user_id,
                emoji: emoji.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    /// Recomputes the per-emoji grouping for a message, largest group first.
    pub async fn groups_for(&self, message_id: Uuid) -> StoreResult<Vec<ReactionGroup>> {
        let reactions = self.db.reactions.read();

        let mut by_emoji: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();
        for r in reactions.values().filter(|r| r.message_id == message_id) {
            by_emoji.entry(r.emoji.clone()).or_default().push(r.user_id);
        }

        let mut groups: Vec<ReactionGroup> = by_emoji
            .into_iter()
            .map(|(emoji, user_ids)| ReactionGroup {
                emoji,
                count: user_ids.len() as u32,
                user_ids,
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(groups)
    }

    /// Drops every reaction row for a hard-deleted message.
    pub async fn remove_for_message(&self, message_id: Uuid) -> StoreResult<u64> {
        let mut reactions = self.db.reactions.write();
        let keys: Vec<(Uuid, Uuid, String)> = reactions
            .keys()
            .filter(|(mid, _, _)| *mid == message_id)
            .cloned()
            .collect();
        let removed = keys.len() as u64;
        for key in keys {
            reactions.remove(&key);
        }
        Ok(removed)
    }
}
