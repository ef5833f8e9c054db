use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::beats::repo_types::TrackCard;

#[derive(Debug, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub profile_photo: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    pub role_id: Option<i32>,
    pub total_likes: i32,
    pub total_plays: i32,
}

#[derive(Debug, Serialize, FromRow)]
pub struct LikedTrackCard {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub track: TrackCard,
    #[serde(with = "time::serde::rfc3339")]
    pub added_to_likes_at: OffsetDateTime,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CartTrackCard {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub track: TrackCard,
    #[serde(with = "time::serde::rfc3339")]
    pub added_to_cart_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
