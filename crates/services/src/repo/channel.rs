use std::sync::Arc;

use chrono::Utc;
use huddle_db::Db;
use huddle_db::models::{Channel, ChannelMember};
use tracing::debug;
use uuid::Uuid;

use super::base::{StoreError, StoreResult};

pub struct ChannelRepo {
    db: Arc<Db>,
}

impl ChannelRepo {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Creates a channel and bulk-inserts its initial membership atomically.
    pub async fn create(
        &self,
        team_id: Uuid,
        name: String,
        description: Option<String>,
        creator_id: Uuid,
        is_private: bool,
        member_ids: &[Uuid],
    ) -> StoreResult<Channel> {
        let mut channels = self.db.channels.write();
        let mut channel_members = self.db.channel_members.write();

        if channels
            .values()
            .any(|c| c.team_id == team_id && c.name == name)
        {
            return Err(StoreError::Duplicate(format!(
                "channel '{name}' already exists in this team"
            )));
        }

        let now = Utc::now();
        let channel = Channel {
            id: Uuid::new_v4(),
            team_id,
            name,
            description,
            creator_id,
            is_private,
            last_message_id: None,
            message_seq: 0,
            created_at: now,
            updated_at: now,
        };

        for user_id in member_ids {
            channel_members.insert(
                (channel.id, *user_id),
                ChannelMember {
                    channel_id: channel.id,
                    team_id,
                    user_id: *user_id,
                    joined_at: now,
                },
            );
        }
        channels.insert(channel.id, channel.clone());

        debug!(channel_id = %channel.id, members = member_ids.len(), "Channel created");
        Ok(channel)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Channel> {
        self.db
            .channels
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Channels of a team visible to a user: all non-private ones plus the
    /// private ones the user belongs to.
    pub async fn find_visible(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Channel>> {
        let channels = self.db.channels.read();
        let members = self.db.channel_members.read();

        let mut result: Vec<Channel> = channels
            .values()
            .filter(|c| c.team_id == team_id)
            .filter(|c| !c.is_private || members.contains_key(&(c.id, user_id)))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    pub async fn is_member(&self, channel_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .db
            .channel_members
            .read()
            .contains_key(&(channel_id, user_id)))
    }

    pub async fn join(&self, channel_id: Uuid, team_id: Uuid, user_id: Uuid) -> StoreResult<ChannelMember> {
        let mut members = self.db.channel_members.write();
        if members.contains_key(&(channel_id, user_id)) {
            return Err(StoreError::Duplicate(
                "already a member of this channel".to_string(),
            ));
        }
        let member = ChannelMember {
            channel_id,
            team_id,
            user_id,
            joined_at: Utc::now(),
        };
        members.insert((channel_id, user_id), member.clone());
        Ok(member)
    }

    pub async fn leave(&self, channel_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .db
            .channel_members
            .write()
            .remove(&(channel_id, user_id))
            .is_some())
    }

    /// Team-join cascade: inserts the user into every non-private channel of
    /// the team. Existing memberships are left untouched.
    pub async fn add_to_public_channels(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let channels = self.db.channels.read();
        let mut members = self.db.channel_members.write();

        let now = Utc::now();
        let mut joined = Vec::new();
        for channel in channels.values().filter(|c| c.team_id == team_id && !c.is_private) {
            if !members.contains_key(&(channel.id, user_id)) {
                members.insert(
                    (channel.id, user_id),
                    ChannelMember {
                        channel_id: channel.id,
                        team_id,
                        user_id,
                        joined_at: now,
                    },
                );
                joined.push(channel.id);
            }
        }
        Ok(joined)
    }

    /// Team-leave cascade: removes the user from every channel of the team,
    /// private ones included.
    pub async fn remove_from_team_channels(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let mut members = self.db.channel_members.write();
        let removed: Vec<Uuid> = members
            .values()
            .filter(|m| m.team_id == team_id && m.user_id == user_id)
            .map(|m| m.channel_id)
            .collect();
        for channel_id in &removed {
            members.remove(&(*channel_id, user_id));
        }
        Ok(removed)
    }

    pub async fn set_last_message(&self, channel_id: Uuid, message_id: Option<Uuid>) -> StoreResult<()> {
        let mut channels = self.db.channels.write();
        let channel = channels.get_mut(&channel_id).ok_or(StoreError::NotFound)?;
        channel.last_message_id = message_id;
        channel.updated_at = Utc::now();
        Ok(())
    }

    /// Assigns the next commit sequence number for the channel's stream.
    /// Callers must hold the channel's engine lock.
    pub async fn next_seq(&self, channel_id: Uuid) -> StoreResult<u64> {
        let mut channels = self.db.channels.write();
        let channel = channels.get_mut(&channel_id).ok_or(StoreError::NotFound)?;
        channel.message_seq += 1;
        Ok(channel.message_seq)
    }
}
