use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::{Channel, ChannelMember, Message, Reaction, Team, TeamMember, User};

/// The in-process storage collaborator: one map per table, each behind its
/// own `RwLock`.
///
/// Multi-table operations must acquire write locks in declaration order
/// (users, teams, team_members, channels, channel_members, messages,
/// reactions) so concurrent cascades cannot deadlock and readers observe
/// each table either fully before or fully after a bulk mutation.
pub struct Db {
    pub users: RwLock<HashMap<Uuid, User>>,
    pub teams: RwLock<HashMap<Uuid, Team>>,
    /// Keyed by (team_id, user_id).
    pub team_members: RwLock<HashMap<(Uuid, Uuid), TeamMember>>,
    pub channels: RwLock<HashMap<Uuid, Channel>>,
    /// Keyed by (channel_id, user_id).
    pub channel_members: RwLock<HashMap<(Uuid, Uuid), ChannelMember>>,
    pub messages: RwLock<HashMap<Uuid, Message>>,
    /// Keyed by the unique (message_id, user_id, emoji) triple.
    pub reactions: RwLock<HashMap<(Uuid, Uuid, String), Reaction>>,
}

impl Db {
    pub fn new() -> Arc<Self> {
        info!("Initializing in-process store");
        Arc::new(Self {
            users: RwLock::new(HashMap::new()),
            teams: RwLock::new(HashMap::new()),
            team_members: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            channel_members: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            reactions: RwLock::new(HashMap::new()),
        })
    }
}
