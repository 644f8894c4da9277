use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum message content length in characters.
pub const MAX_CONTENT_LEN: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    File,
    Image,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub channel_id: Uuid,
    /// Denormalized from the channel for query convenience.
    pub team_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    pub file_ref: Option<String>,
    /// Reply threading: the message this one replies to.
    pub parent_id: Option<Uuid>,
    /// Commit order within the channel, assigned by the mutation engine.
    pub seq: u64,
    /// Set exactly when content is mutated post-creation, never unset.
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
