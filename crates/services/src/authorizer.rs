use std::sync::Arc;

use huddle_db::models::TeamRole;
use uuid::Uuid;

use crate::repo::{ChannelRepo, StoreResult, TeamRepo};

/// Re-validates membership against persisted state on every call — never
/// cached, so a join/leave takes effect on the very next operation even on
/// connections opened before the change.
pub struct MembershipAuthorizer {
    teams: Arc<TeamRepo>,
    channels: Arc<ChannelRepo>,
}

impl MembershipAuthorizer {
    pub fn new(teams: Arc<TeamRepo>, channels: Arc<ChannelRepo>) -> Self {
        Self { teams, channels }
    }

    /// Whether the user may join the channel (room subscription or persisted
    /// membership). Non-private channels admit any team member; private
    /// channels admit only existing channel members.
    ///
    /// Errors with `NotFound` only when the channel itself does not exist.
    pub async fn can_join_channel(&self, user_id: Uuid, channel_id: Uuid) -> StoreResult<bool> {
        let channel = self.channels.find_by_id(channel_id).await?;
        if channel.is_private {
            self.channels.is_member(channel_id, user_id).await
        } else {
            self.teams.is_member(channel.team_id, user_id).await
        }
    }

    /// Whether the user may mutate the channel's stream: must be an existing
    /// channel member.
    pub async fn can_mutate_channel(&self, user_id: Uuid, channel_id: Uuid) -> StoreResult<bool> {
        // Raise NotFound for a missing channel, deny for non-membership.
        self.channels.find_by_id(channel_id).await?;
        self.channels.is_member(channel_id, user_id).await
    }

    pub async fn is_team_member(&self, user_id: Uuid, team_id: Uuid) -> StoreResult<bool> {
        self.teams.find_by_id(team_id).await?;
        self.teams.is_member(team_id, user_id).await
    }

    /// Owner or role=admin.
    pub async fn can_manage_team(&self, user_id: Uuid, team_id: Uuid) -> StoreResult<bool> {
        let team = self.teams.find_by_id(team_id).await?;
        if team.owner_id == user_id {
            return Ok(true);
        }
        Ok(self.teams.member_role(team_id, user_id).await? == Some(TeamRole::Admin))
    }
}
