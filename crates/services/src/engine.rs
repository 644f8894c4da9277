use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use huddle_db::models::{Channel, MAX_CONTENT_LEN, Message, MessageType, Team, TeamRole};
use nanoid::nanoid;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::authorizer::MembershipAuthorizer;
use crate::events::{ChannelView, ErrorCode, MessageView, ServerEvent};
use crate::registry::{ConnectionRegistry, RoomKey};
use crate::repo::{
    ChannelRepo, MessageRepo, PaginatedResult, PaginationParams, ReactionRepo, StoreError,
    TeamRepo, UserRepo,
};

const INVITE_CODE_LEN: usize = 12;
const MAX_NAME_LEN: usize = 80;
const MAX_EMOJI_LEN: usize = 32;
const DEFAULT_CHANNELS: [&str; 2] = ["general", "random"];

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Access denied")]
    AccessDenied,
    #[error("Not found")]
    NotFound,
    #[error("Validation: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid invite code")]
    InvalidInvite,
    #[error("The team owner cannot leave the team")]
    OwnerCannotLeave,
    #[error("Operation timed out")]
    Timeout,
    #[error("Internal: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => EngineError::NotFound,
            StoreError::Duplicate(msg) => EngineError::Conflict(msg),
        }
    }
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::AccessDenied => ErrorCode::AccessDenied,
            EngineError::NotFound => ErrorCode::NotFound,
            EngineError::Validation(_) => ErrorCode::Validation,
            EngineError::Conflict(_) => ErrorCode::Conflict,
            EngineError::InvalidInvite => ErrorCode::InvalidInvite,
            EngineError::OwnerCannotLeave => ErrorCode::OwnerCannotLeave,
            EngineError::Timeout => ErrorCode::Timeout,
            EngineError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Serializes mutations against shared conversation state and fans the
/// resulting events out to room subscribers.
///
/// Mutations against one channel (post/edit/delete/react and persisted
/// channel-membership changes) pass through that channel's mutex; the lock
/// spans exactly the storage write plus the broadcast enqueue, so broadcast
/// order equals commit order for every subscriber. Unrelated channels never
/// contend.
pub struct ConversationEngine {
    users: Arc<UserRepo>,
    teams: Arc<TeamRepo>,
    channels: Arc<ChannelRepo>,
    messages: Arc<MessageRepo>,
    reactions: Arc<ReactionRepo>,
    authorizer: Arc<MembershipAuthorizer>,
    registry: Arc<ConnectionRegistry>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    op_timeout: Duration,
}

impl ConversationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<UserRepo>,
        teams: Arc<TeamRepo>,
        channels: Arc<ChannelRepo>,
        messages: Arc<MessageRepo>,
        reactions: Arc<ReactionRepo>,
        authorizer: Arc<MembershipAuthorizer>,
        registry: Arc<ConnectionRegistry>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            users,
            teams,
            channels,
            messages,
            reactions,
            authorizer,
            registry,
            locks: DashMap::new(),
            op_timeout,
        }
    }

    /// Acquires the channel's exclusion with a bounded wait. The guard is
    /// RAII, so release happens on every exit path, error or not.
    async fn lock_channel(&self, channel_id: Uuid) -> EngineResult<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        tokio::time::timeout(self.op_timeout, lock.lock_owned())
            .await
            .map_err(|_| EngineError::Timeout)
    }

    // --- Message stream mutations ---

    pub async fn post_message(
        &self,
        sender_id: Uuid,
        channel_id: Uuid,
        content: String,
        parent_id: Option<Uuid>,
    ) -> EngineResult<MessageView> {
        let content = validate_content(content)?;

        if !self
            .authorizer
            .can_mutate_channel(sender_id, channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }
        let channel = self.channels.find_by_id(channel_id).await?;

        if let Some(pid) = parent_id {
            let parent = self.messages.find_by_id(pid).await?;
            if parent.channel_id != channel_id {
                return Err(EngineError::Validation(
                    "parent message belongs to a different channel".to_string(),
                ));
            }
        }

        let _guard = self.lock_channel(channel_id).await?;

        let seq = self.channels.next_seq(channel_id).await?;
        let message = self
            .messages
            .insert(Message {
                id: Uuid::new_v4(),
                channel_id,
                team_id: channel.team_id,
                sender_id,
                content,
                message_type: MessageType::Text,
                file_ref: None,
                parent_id,
                seq,
                edited_at: None,
                created_at: Utc::now(),
            })
            .await?;
        self.channels
            .set_last_message(channel_id, Some(message.id))
            .await?;

        let sender = self.users.find_by_id(sender_id).await?;
        let view = MessageView::from_parts(message, &sender, Vec::new());
        self.registry.broadcast(
            RoomKey::Channel(channel_id),
            &ServerEvent::MessageCreated(view.clone()),
        );
        debug!(channel_id = %channel_id, seq, "Message committed");
        Ok(view)
    }

    pub async fn edit_message(
        &self,
        sender_id: Uuid,
        message_id: Uuid,
        content: String,
    ) -> EngineResult<MessageView> {
        let content = validate_content(content)?;

        let existing = self.messages.find_by_id(message_id).await?;
        // A non-sender and a missing message are indistinguishable to the
        // caller.
        if existing.sender_id != sender_id {
            return Err(EngineError::NotFound);
        }
        if !self
            .authorizer
            .can_mutate_channel(sender_id, existing.channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }

        let _guard = self.lock_channel(existing.channel_id).await?;

        let updated = self.messages.update_content(message_id, content).await?;
        let sender = self.users.find_by_id(sender_id).await?;
        let reactions = self.reactions.groups_for(message_id).await?;
        let view = MessageView::from_parts(updated, &sender, reactions);
        self.registry.broadcast(
            RoomKey::Channel(view.channel_id),
            &ServerEvent::MessageEdited(view.clone()),
        );
        Ok(view)
    }

    pub async fn delete_message(&self, sender_id: Uuid, message_id: Uuid) -> EngineResult<()> {
        let existing = self.messages.find_by_id(message_id).await?;
        if existing.sender_id != sender_id {
            return Err(EngineError::NotFound);
        }
        if !self
            .authorizer
            .can_mutate_channel(sender_id, existing.channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }

        let channel_id = existing.channel_id;
        let _guard = self.lock_channel(channel_id).await?;

        self.messages.delete(message_id).await?;
        self.reactions.remove_for_message(message_id).await?;

        // Repair the denormalized last-message pointer.
        let channel = self.channels.find_by_id(channel_id).await?;
        if channel.last_message_id == Some(message_id) {
            let latest = self.messages.latest_in_channel(channel_id).await?;
            self.channels
                .set_last_message(channel_id, latest.map(|m| m.id))
                .await?;
        }

        self.registry.broadcast(
            RoomKey::Channel(channel_id),
            &ServerEvent::MessageDeleted {
                message_id,
                channel_id,
            },
        );
        Ok(())
    }

    /// Toggle semantics: an existing (user, message, emoji) triple is
    /// removed, a missing one created. Broadcasts the full message with its
    /// reaction set recomputed, so receivers never reconcile deltas.
    /// Returns true when the reaction was added.
    pub async fn toggle_reaction(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        emoji: String,
    ) -> EngineResult<(bool, MessageView)> {
        if emoji.trim().is_empty() || emoji.chars().count() > MAX_EMOJI_LEN {
            return Err(EngineError::Validation("invalid emoji".to_string()));
        }

        let located = self.messages.find_by_id(message_id).await?;
        if !self
            .authorizer
            .can_mutate_channel(user_id, located.channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }

        let channel_id = located.channel_id;
        let _guard = self.lock_channel(channel_id).await?;

        // Re-read under the lock: an edit may have committed while this
        // operation waited, and the broadcast must carry the post-mutation
        // content.
        let message = self.messages.find_by_id(message_id).await?;
        let added = self
            .reactions
            .toggle(message_id, channel_id, user_id, &emoji)
            .await?;
        let reactions = self.reactions.groups_for(message_id).await?;
        let sender = self.users.find_by_id(message.sender_id).await?;
        let view = MessageView::from_parts(message, &sender, reactions);
        self.registry.broadcast(
            RoomKey::Channel(channel_id),
            &ServerEvent::MessageEdited(view.clone()),
        );
        Ok((added, view))
    }

    /// Typing is ephemeral: membership-checked, broadcast to the channel
    /// room minus the originating connection, never persisted.
    pub async fn typing(
        &self,
        connection_id: &str,
        user_id: Uuid,
        channel_id: Uuid,
        is_typing: bool,
    ) -> EngineResult<()> {
        if !self
            .authorizer
            .can_mutate_channel(user_id, channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }
        let user = self.users.find_by_id(user_id).await?;
        self.registry.broadcast_except(
            RoomKey::Channel(channel_id),
            connection_id,
            &ServerEvent::Typing {
                channel_id,
                user_id,
                username: user.username,
                is_typing,
            },
        );
        Ok(())
    }

    /// Paginated history, newest page first, each page re-reversed to
    /// chronological reading order.
    pub async fn channel_history(
        &self,
        user_id: Uuid,
        channel_id: Uuid,
        params: &PaginationParams,
    ) -> EngineResult<PaginatedResult<MessageView>> {
        if !self
            .authorizer
            .can_mutate_channel(user_id, channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }

        let page = self.messages.find_in_channel(channel_id, params).await?;
        let mut views = Vec::with_capacity(page.items.len());
        for message in page.items.into_iter().rev() {
            let sender = self.users.find_by_id(message.sender_id).await?;
            let reactions = self.reactions.groups_for(message.id).await?;
            views.push(MessageView::from_parts(message, &sender, reactions));
        }

        Ok(PaginatedResult {
            items: views,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        })
    }

    // --- Team lifecycle ---

    /// Creates the team with the caller as owner/admin, an invite code, and
    /// the default channels seeded with the owner as sole member —
    /// all-or-nothing in the store.
    pub async fn create_team(
        &self,
        owner_id: Uuid,
        name: String,
        description: Option<String>,
    ) -> EngineResult<(Team, Vec<Channel>)> {
        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(EngineError::Validation(format!(
                "team name must be 1-{MAX_NAME_LEN} characters"
            )));
        }

        let invite_code = nanoid!(INVITE_CODE_LEN);
        let (team, channels) = self
            .teams
            .create_team(owner_id, name, description, invite_code, &DEFAULT_CHANNELS)
            .await?;
        info!(team_id = %team.id, "Team created");
        Ok((team, channels))
    }

    pub async fn join_team_by_invite(&self, user_id: Uuid, invite_code: &str) -> EngineResult<Team> {
        let team = self
            .teams
            .find_by_invite_code(invite_code.trim())
            .await
            .map_err(|_| EngineError::InvalidInvite)?;

        if self.teams.is_member(team.id, user_id).await? {
            return Err(EngineError::Conflict(
                "already a member of this team".to_string(),
            ));
        }

        self.teams
            .add_member(team.id, user_id, TeamRole::Member)
            .await?;
        // Cascade into every non-private channel of the team.
        self.channels
            .add_to_public_channels(team.id, user_id)
            .await?;

        let user = self.users.find_by_id(user_id).await?;
        self.registry.broadcast(
            RoomKey::Team(team.id),
            &ServerEvent::MemberJoined {
                team_id: team.id,
                user_id,
                username: user.username,
            },
        );
        Ok(team)
    }

    pub async fn leave_team(&self, user_id: Uuid, team_id: Uuid) -> EngineResult<()> {
        let team = self.teams.find_by_id(team_id).await?;
        if team.owner_id == user_id {
            return Err(EngineError::OwnerCannotLeave);
        }
        if !self.teams.remove_member(team_id, user_id).await? {
            return Err(EngineError::NotFound);
        }
        // Cascade out of every channel of the team, private ones included.
        self.channels
            .remove_from_team_channels(team_id, user_id)
            .await?;
        Ok(())
    }

    pub async fn regenerate_invite(&self, user_id: Uuid, team_id: Uuid) -> EngineResult<String> {
        if !self.authorizer.can_manage_team(user_id, team_id).await? {
            return Err(EngineError::AccessDenied);
        }
        let code = nanoid!(INVITE_CODE_LEN);
        self.teams.set_invite_code(team_id, code.clone()).await?;
        Ok(code)
    }

    // --- Channel lifecycle ---

    pub async fn create_channel(
        &self,
        creator_id: Uuid,
        team_id: Uuid,
        name: String,
        description: Option<String>,
        is_private: bool,
    ) -> EngineResult<ChannelView> {
        if !self.authorizer.can_manage_team(creator_id, team_id).await? {
            return Err(EngineError::AccessDenied);
        }

        // Normalization is an explicit step here, ahead of the persist, so
        // its ordering relative to the broadcast is auditable.
        let name = normalize_channel_name(&name)?;

        let member_ids = if is_private {
            vec![creator_id]
        } else {
            // Everyone currently on the team, creator included.
            let mut ids = self.teams.member_user_ids(team_id).await?;
            if !ids.contains(&creator_id) {
                ids.push(creator_id);
            }
            ids
        };

        let channel = self
            .channels
            .create(team_id, name, description, creator_id, is_private, &member_ids)
            .await?;

        let view = ChannelView::from(channel);
        self.registry.broadcast(
            RoomKey::Team(team_id),
            &ServerEvent::ChannelCreated(view.clone()),
        );
        Ok(view)
    }

    pub async fn join_channel(&self, user_id: Uuid, channel_id: Uuid) -> EngineResult<ChannelView> {
        let channel = self.channels.find_by_id(channel_id).await?;
        if !self
            .authorizer
            .can_join_channel(user_id, channel_id)
            .await?
        {
            return Err(EngineError::AccessDenied);
        }

        let _guard = self.lock_channel(channel_id).await?;
        self.channels
            .join(channel_id, channel.team_id, user_id)
            .await?;
        Ok(ChannelView::from(channel))
    }

    /// Leaving a channel never cascades back to team membership.
    pub async fn leave_channel(&self, user_id: Uuid, channel_id: Uuid) -> EngineResult<()> {
        self.channels.find_by_id(channel_id).await?;

        let _guard = self.lock_channel(channel_id).await?;
        if !self.channels.leave(channel_id, user_id).await? {
            return Err(EngineError::NotFound);
        }
        Ok(())
    }
}

fn validate_content(content: String) -> EngineResult<String> {
    if content.trim().is_empty() {
        return Err(EngineError::Validation(
            "message content must not be blank".to_string(),
        ));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(EngineError::Validation(format!(
            "message content must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(content)
}

/// Lowercases, collapses whitespace runs to `-`, and strips everything but
/// alphanumerics, `-` and `_`. The `#` display marker is added only in
/// response payloads.
fn normalize_channel_name(raw: &str) -> EngineResult<String> {
    let name: String = raw
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::Validation(format!(
            "channel name must normalize to 1-{MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}
