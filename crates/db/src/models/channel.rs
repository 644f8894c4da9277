use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub team_id: Uuid,
    /// Normalized name without the `#` display marker.
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub is_private: bool,
    /// Denormalized pointer for channel list views.
    pub last_message_id: Option<Uuid>,
    /// Next commit sequence number for this channel's message stream.
    pub message_seq: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    pub fn display_name(&self) -> String {
        format!("#{}", self.name)
    }
}
