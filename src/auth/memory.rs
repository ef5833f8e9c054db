use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

/// In-process `UserStore` used by tests; mirrors the unique `lower(email)` index.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn set_active(&self, id: i32, active: bool) {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.is_active = active;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: i32) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        let lowered = new.email.to_lowercase();
        if users.iter().any(|u| u.email.to_lowercase() == lowered) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: users.len() as i32 + 1,
            email: new.email,
            username: new.username,
            hashed_password: new.hashed_password,
            role_id: Some(new.role_id),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            profile_photo: None,
            total_likes: 0,
            total_plays: 0,
            registered_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, id: i32, hashed_password: &str) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("user {id} not found"))?;
        user.hashed_password = hashed_password.to_string();
        Ok(())
    }
}
