use std::collections::HashSet;
use std::fmt;

use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::ServerEvent;

/// A named broadcast scope a connection can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Team(Uuid),
    Channel(Uuid),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::Team(id) => write!(f, "team:{id}"),
            RoomKey::Channel(id) => write!(f, "channel:{id}"),
        }
    }
}

struct ConnectionEntry {
    user_id: Uuid,
    /// Per-connection send buffer. Broadcast only enqueues here; a writer
    /// task owned by the transport drains it, so one slow socket can never
    /// stall fan-out to the rest of a room.
    tx: UnboundedSender<String>,
    rooms: HashSet<RoomKey>,
}

/// Tracks live connections, their authenticated identity, and their room
/// subscriptions. Constructed per process (or per test) and injected —
/// deliberately not a global.
pub struct ConnectionRegistry {
    connections: DashMap<String, ConnectionEntry>,
    rooms: DashMap<RoomKey, HashSet<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Registers a connection for an authenticated identity and hands back
    /// its id plus the receiving end of its send buffer.
    pub fn open_connection(&self, user_id: Uuid) -> (String, UnboundedReceiver<String>) {
        let connection_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(
            connection_id.clone(),
            ConnectionEntry {
                user_id,
                tx,
                rooms: HashSet::new(),
            },
        );
        debug!(%user_id, %connection_id, "Connection opened");
        (connection_id, rx)
    }

    /// Subscribes the connection to a room. Authorization is the caller's
    /// responsibility; the registry only tracks subscription state.
    pub fn join_room(&self, connection_id: &str, room: RoomKey) {
        if let Some(mut entry) = self.connections.get_mut(connection_id) {
            entry.rooms.insert(room);
        } else {
            return;
        }
        self.rooms
            .entry(room)
            .or_default()
            .insert(connection_id.to_string());
        debug!(%connection_id, %room, "Joined room");
    }

    pub fn leave_room(&self, connection_id: &str, room: RoomKey) {
        if let Some(mut entry) = self.connections.get_mut(connection_id) {
            entry.rooms.remove(&room);
        }
        if let Some(mut subscribers) = self.rooms.get_mut(&room) {
            subscribers.remove(connection_id);
            if subscribers.is_empty() {
                drop(subscribers);
                self.rooms.remove_if(&room, |_, s| s.is_empty());
            }
        }
    }

    /// Drops the connection from every room it had joined, then removes it.
    /// Dropping the entry closes its send buffer, ending the writer task.
    pub fn close_connection(&self, connection_id: &str) {
        let rooms: Vec<RoomKey> = self
            .connections
            .get(connection_id)
            .map(|e| e.rooms.iter().copied().collect())
            .unwrap_or_default();
        for room in rooms {
            self.leave_room(connection_id, room);
        }
        if let Some((_, entry)) = self.connections.remove(connection_id) {
            debug!(user_id = %entry.user_id, %connection_id, "Connection closed");
        }
    }

    /// Best-effort fan-out: enqueues the event on every current subscriber's
    /// send buffer. No acknowledgment, no retry — a connection torn down
    /// mid-delivery simply misses it.
    pub fn broadcast(&self, room: RoomKey, event: &ServerEvent) {
        self.broadcast_inner(room, None, event);
    }

    /// Fan-out excluding one connection (typing indicators skip the sender).
    pub fn broadcast_except(&self, room: RoomKey, except: &str, event: &ServerEvent) {
        self.broadcast_inner(room, Some(except), event);
    }

    fn broadcast_inner(&self, room: RoomKey, except: Option<&str>, event: &ServerEvent) {
        // Snapshot the subscriber set so concurrent join/leave never exposes
        // a partially-updated view to this delivery pass.
        let subscribers: Vec<String> = match self.rooms.get(&room) {
            Some(set) => set.iter().cloned().collect(),
            None => return,
        };

        let text = match serde_json::to_string(event) {
            Ok(t) => t,
            Err(e) => {
                warn!(%room, %e, "Failed to serialize event");
                return;
            }
        };

        for connection_id in subscribers {
            if except == Some(connection_id.as_str()) {
                continue;
            }
            self.send_raw(&connection_id, text.clone());
        }
    }

    /// Sends an event to a single connection (operation errors, pongs).
    pub fn send_to(&self, connection_id: &str, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(text) => self.send_raw(connection_id, text),
            Err(e) => warn!(%connection_id, %e, "Failed to serialize event"),
        }
    }

    fn send_raw(&self, connection_id: &str, text: String) {
        if let Some(entry) = self.connections.get(connection_id) {
            // A full/closed buffer means the connection is going away; its
            // cleanup path handles the rest.
            let _ = entry.tx.send(text);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_size(&self, room: RoomKey) -> usize {
        self.rooms.get(&room).map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
