use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    /// Accepted for client compatibility; the server always assigns the default role.
    #[serde(default, alias = "roleId")]
    #[allow(dead_code)]
    pub role_id: Option<i32>,
}

/// OAuth2-style password form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub role_id: Option<i32>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role_id: u.role_id,
            is_active: u.is_active,
            is_superuser: u.is_superuser,
            is_verified: u.is_verified,
            registered_at: u.registered_at,
        }
    }
}
