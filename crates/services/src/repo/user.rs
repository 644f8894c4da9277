use std::sync::Arc;

use chrono::Utc;
use huddle_db::Db;
use huddle_db::models::User;
use uuid::Uuid;

use super::base::{StoreError, StoreResult};

pub struct UserRepo {
    db: Arc<Db>,
}

impl UserRepo {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> StoreResult<User> {
        let mut users = self.db.users.write();

        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(format!(
                "email '{email}' is already registered"
            )));
        }
        if users.values().any(|u| u.username == username) {
            return Err(StoreError::Duplicate(format!(
                "username '{username}' is taken"
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            username,
            first_name,
            last_name,
            password_hash,
            is_online: false,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<User> {
        self.db
            .users
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        self.db
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> StoreResult<User> {
        self.db
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub async fn set_online(&self, user_id: Uuid) -> StoreResult<()> {
        let mut users = self.db.users.write();
        let user = users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.is_online = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    /// Flips the user offline and stamps last-seen.
    pub async fn set_offline(&self, user_id: Uuid) -> StoreResult<()> {
        let mut users = self.db.users.write();
        let user = users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        user.is_online = false;
        user.last_seen_at = Some(now);
        user.updated_at = now;
        Ok(())
    }
}
