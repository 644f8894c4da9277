use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::repo::{StoreResult, UserRepo};

/// Tracks online/offline + last-seen per user. A user may hold several
/// simultaneous connections (tabs, devices), so transitions are driven by a
/// per-user reference count, not by individual disconnects.
pub struct PresenceTracker {
    users: Arc<UserRepo>,
    active: DashMap<Uuid, usize>,
}

impl PresenceTracker {
    pub fn new(users: Arc<UserRepo>) -> Self {
        Self {
            users,
            active: DashMap::new(),
        }
    }

    /// Registers a connection; the first one flips the user online.
    pub async fn connect(&self, user_id: Uuid) -> StoreResult<()> {
        let first = {
            let mut count = self.active.entry(user_id).or_insert(0);
            *count += 1;
            *count == 1
        };

        if first {
            debug!(%user_id, "Presence online");
            self.users.set_online(user_id).await?;
        }
        Ok(())
    }

    /// Deregisters a connection; only the last one flips the user offline
    /// and stamps last-seen.
    pub async fn disconnect(&self, user_id: Uuid) -> StoreResult<()> {
        match self.active.get_mut(&user_id) {
            Some(mut count) => *count = count.saturating_sub(1),
            None => return Ok(()),
        }

        // The zero check is re-evaluated under the shard lock, so a connect
        // that lands after the decrement keeps the entry alive and the user
        // online.
        if self.active.remove_if(&user_id, |_, count| *count == 0).is_some() {
            debug!(%user_id, "Presence offline");
            self.users.set_offline(user_id).await?;
        }
        Ok(())
    }
}
