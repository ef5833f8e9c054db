use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Role every self-registered account receives.
pub const DEFAULT_ROLE_ID: i32 = 1;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2 PHC string, not exposed in JSON
    pub role_id: Option<i32>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub profile_photo: Option<String>,
    pub total_likes: i32,
    pub total_plays: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

/// Fields the store needs to insert a user; everything else takes column defaults.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub role_id: i32,
}
