use std::sync::Arc;

use chrono::Utc;
use huddle_db::Db;
use huddle_db::models::{Channel, ChannelMember, Team, TeamMember, TeamRole, User};
use tracing::debug;
use uuid::Uuid;

use super::base::{StoreError, StoreResult};

pub struct TeamRepo {
    db: Arc<Db>,
}

impl TeamRepo {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Creates a team, its owner membership (role admin), and the default
    /// channels with the owner as sole member — all-or-nothing under the
    /// table write locks, taken in the fixed order documented on `Db`.
    pub async fn create_team(
        &self,
        owner_id: Uuid,
        name: String,
        description: Option<String>,
        invite_code: String,
        default_channels: &[&str],
    ) -> StoreResult<(Team, Vec<Channel>)> {
        let mut teams = self.db.teams.write();
        let mut team_members = self.db.team_members.write();
        let mut channels = self.db.channels.write();
        let mut channel_members = self.db.channel_members.write();

        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name,
            description,
            owner_id,
            invite_code,
            created_at: now,
            updated_at: now,
        };

        teams.insert(team.id, team.clone());
        team_members.insert(
            (team.id, owner_id),
            TeamMember {
                team_id: team.id,
                user_id: owner_id,
                role: TeamRole::Admin,
                joined_at: now,
            },
        );

        let mut created = Vec::with_capacity(default_channels.len());
        for name in default_channels {
            let channel = Channel {
                id: Uuid::new_v4(),
                team_id: team.id,
                name: name.to_string(),
                description: None,
                creator_id: owner_id,
                is_private: false,
                last_message_id: None,
                message_seq: 0,
                created_at: now,
                updated_at: now,
            };
            channel_members.insert(
                (channel.id, owner_id),
                ChannelMember {
                    channel_id: channel.id,
                    team_id: team.id,
                    user_id: owner_id,
                    joined_at: now,
                },
            );
            channels.insert(channel.id, channel.clone());
            created.push(channel);
        }

        debug!(team_id = %team.id, "Team created with default channels");
        Ok((team, created))
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Team> {
        self.db
            .teams
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub async fn find_by_invite_code(&self, code: &str) -> StoreResult<Team> {
        self.db
            .teams
            .read()
            .values()
            .find(|t| t.invite_code == code)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub async fn find_user_teams(&self, user_id: Uuid) -> StoreResult<Vec<Team>> {
        let teams = self.db.teams.read();
        let members = self.db.team_members.read();

        let mut result: Vec<Team> = members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| teams.get(&m.team_id).cloned())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    pub async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .db
            .team_members
            .read()
            .contains_key(&(team_id, user_id)))
    }

    pub async fn member_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<TeamRole>> {
        Ok(self
            .db
            .team_members
            .read()
            .get(&(team_id, user_id))
            .map(|m| m.role))
    }

    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> StoreResult<TeamMember> {
        let mut members = self.db.team_members.write();
        if members.contains_key(&(team_id, user_id)) {
            return Err(StoreError::Duplicate(
                "already a member of this team".to_string(),
            ));
        }
        let member = TeamMember {
            team_id,
            user_id,
            role,
            joined_at: Utc::now(),
        };
        members.insert((team_id, user_id), member.clone());
        Ok(member)
    }

    pub async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .db
            .team_members
            .write()
            .remove(&(team_id, user_id))
            .is_some())
    }

    pub async fn member_user_ids(&self, team_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .db
            .team_members
            .read()
            .values()
            .filter(|m| m.team_id == team_id)
            .map(|m| m.user_id)
            .collect())
    }

    /// Named query shape: team membership rows joined with their users,
    /// ordered by join time.
    pub async fn members_with_users(
        &self,
        team_id: Uuid,
    ) -> StoreResult<Vec<(TeamMember, User)>> {
        // Table locks in declaration order: users before team_members.
        let users = self.db.users.read();
        let members = self.db.team_members.read();

        let mut result: Vec<(TeamMember, User)> = members
            .values()
            .filter(|m| m.team_id == team_id)
            .filter_map(|m| users.get(&m.user_id).map(|u| (m.clone(), u.clone())))
            .collect();
        result.sort_by_key(|(m, _)| m.joined_at);
        Ok(result)
    }

    pub async fn set_invite_code(&self, team_id: Uuid, code: String) -> StoreResult<()> {
        let mut teams = self.db.teams.write();
        let team = teams.get_mut(&team_id).ok_or(StoreError::NotFound)?;
        team.invite_code = code;
        team.updated_at = Utc::now();
        Ok(())
    }
}
