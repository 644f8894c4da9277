use chrono::{DateTime, Utc};
use huddle_db::models::{Channel, Message, MessageType, ReactionGroup, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commands a client may send over the persistent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientCommand {
    JoinTeamRooms {
        team_ids: Vec<Uuid>,
    },
    JoinChannel {
        channel_id: Uuid,
    },
    LeaveChannel {
        channel_id: Uuid,
    },
    SendMessage {
        channel_id: Uuid,
        content: String,
        #[serde(default)]
        parent_id: Option<Uuid>,
    },
    EditMessage {
        message_id: Uuid,
        content: String,
    },
    DeleteMessage {
        message_id: Uuid,
    },
    Typing {
        channel_id: Uuid,
        is_typing: bool,
    },
    Ping,
}

/// Events the server pushes to subscribed connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Connected {
        user_id: Uuid,
        connection_id: String,
    },
    MessageCreated(MessageView),
    MessageEdited(MessageView),
    MessageDeleted {
        message_id: Uuid,
        channel_id: Uuid,
    },
    Typing {
        channel_id: Uuid,
        user_id: Uuid,
        username: String,
        is_typing: bool,
    },
    ChannelCreated(ChannelView),
    MemberJoined {
        team_id: Uuid,
        user_id: Uuid,
        username: String,
    },
    OperationError {
        code: ErrorCode,
        message: String,
    },
    Pong,
}

/// Client-facing error categories: enough to decide between retry
/// (timeout/internal), re-auth (unauthenticated), and static display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    Unauthenticated,
    AccessDenied,
    NotFound,
    Validation,
    Conflict,
    InvalidInvite,
    OwnerCannotLeave,
    Timeout,
    Internal,
}

/// Canonical full-message payload: what every subscriber receives on
/// create/edit/react, sender display fields and recomputed reactions
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub team_id: Uuid,
    pub sender: SenderView,
    pub content: String,
    pub message_type: MessageType,
    pub file_ref: Option<String>,
    pub parent_id: Option<Uuid>,
    pub seq: u64,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub reactions: Vec<ReactionGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderView {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelView {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub is_private: bool,
    pub last_message_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn from_parts(message: Message, sender: &User, reactions: Vec<ReactionGroup>) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            team_id: message.team_id,
            sender: SenderView {
                id: sender.id,
                username: sender.username.clone(),
                first_name: sender.first_name.clone(),
                last_name: sender.last_name.clone(),
            },
            content: message.content,
            message_type: message.message_type,
            file_ref: message.file_ref,
            parent_id: message.parent_id,
            seq: message.seq,
            edited_at: message.edited_at,
            created_at: message.created_at,
            reactions,
        }
    }
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        Self {
            display_name: channel.display_name(),
            id: channel.id,
            team_id: channel.team_id,
            name: channel.name,
            description: channel.description,
            creator_id: channel.creator_id,
            is_private: channel.is_private,
            last_message_id: channel.last_message_id,
            created_at: channel.created_at,
        }
    }
}
