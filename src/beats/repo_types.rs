use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Beat joined with the public fields of its owner.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrackCard {
    pub beat_id: i32,
    pub user_id: i32,
    pub title: String,
    pub price: i32,
    pub bpm: i32,
    pub mood: Option<String>,
    pub genre: Option<String>,
    pub tags: Option<String>,
    pub image: Option<String>,
    pub audio_file: String,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    pub likes_count: i32,
    pub plays_count: i32,
    pub username: String,
    pub user_total_likes: i32,
    pub user_total_plays: i32,
    pub profile_photo: Option<String>,
}

pub(crate) const TRACK_CARD_SELECT: &str = r#"
    SELECT b.beat_id, b.user_id, b.title, b.price, b.bpm, b.mood, b.genre, b.tags,
           b.image, b.audio_file, b.added_at, b.likes_count, b.plays_count,
           u.username, u.total_likes AS user_total_likes,
           u.total_plays AS user_total_plays, u.profile_photo
      FROM beats b
      JOIN users u ON u.user_id = b.user_id
"#;
