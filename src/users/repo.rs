use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use super::dto::{CartTrackCard, LikedTrackCard, UserProfile};
use crate::beats::repo_types::{TrackCard, TRACK_CARD_SELECT};

/// Outcome of a like/unlike/cart write against a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
    BeatNotFound,
}

pub async fn get_profile(db: &PgPool, user_id: i32) -> anyhow::Result<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT user_id, email, username, profile_photo, registered_at, role_id,
               total_likes, total_plays
          FROM users
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get user profile")?;
    Ok(profile)
}

pub async fn list_tracks(db: &PgPool, user_id: i32) -> anyhow::Result<Vec<TrackCard>> {
    let rows = sqlx::query_as::<_, TrackCard>(&format!(
        "{TRACK_CARD_SELECT} WHERE b.user_id = $1 ORDER BY b.added_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list user tracks")?;
    Ok(rows)
}

pub async fn list_liked(db: &PgPool, user_id: i32) -> anyhow::Result<Vec<LikedTrackCard>> {
    let rows = sqlx::query_as::<_, LikedTrackCard>(
        r#"
        SELECT b.beat_id, b.user_id, b.title, b.price, b.bpm, b.mood, b.genre, b.tags,
               b.image, b.audio_file, b.added_at, b.likes_count, b.plays_count,
               u.username, u.total_likes AS user_total_likes,
               u.total_plays AS user_total_plays, u.profile_photo,
               l.added_at AS added_to_likes_at
          FROM likes l
          JOIN beats b ON b.beat_id = l.beat_id
          JOIN users u ON u.user_id = b.user_id
         WHERE l.user_id = $1
         ORDER BY l.added_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list liked beats")?;
    Ok(rows)
}

pub async fn list_cart(db: &PgPool, user_id: i32) -> anyhow::Result<Vec<CartTrackCard>> {
    let rows = sqlx::query_as::<_, CartTrackCard>(
        r#"
        SELECT b.beat_id, b.user_id, b.title, b.price, b.bpm, b.mood, b.genre, b.tags,
               b.image, b.audio_file, b.added_at, b.likes_count, b.plays_count,
               u.username, u.total_likes AS user_total_likes,
               u.total_plays AS user_total_plays, u.profile_photo,
               c.added_at AS added_to_cart_at
          FROM carts c
          JOIN beats b ON b.beat_id = c.beat_id
          JOIN users u ON u.user_id = b.user_id
         WHERE c.user_id = $1
         ORDER BY c.added_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list cart")?;
    Ok(rows)
}

/// Locks the beat row and returns its owner.
async fn lock_beat_owner(
    tx: &mut Transaction<'_, Postgres>,
    beat_id: i32,
) -> anyhow::Result<Option<i32>> {
    let owner = sqlx::query_scalar("SELECT user_id FROM beats WHERE beat_id = $1 FOR UPDATE")
        .bind(beat_id)
        .fetch_optional(&mut **tx)
        .await
        .context("lock beat")?;
    Ok(owner)
}

async fn bump_like_counters(
    tx: &mut Transaction<'_, Postgres>,
    beat_id: i32,
    owner: i32,
    delta: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE beats SET likes_count = GREATEST(likes_count + $1, 0) WHERE beat_id = $2",
    )
    .bind(delta)
    .bind(beat_id)
    .execute(&mut **tx)
    .await
    .context("update beat likes")?;

    sqlx::query(
        "UPDATE users SET total_likes = GREATEST(total_likes + $1, 0) WHERE user_id = $2",
    )
    .bind(delta)
    .bind(owner)
    .execute(&mut **tx)
    .await
    .context("update owner likes")?;
    Ok(())
}

pub async fn like(db: &PgPool, user_id: i32, beat_id: i32) -> anyhow::Result<Change> {
    let mut tx = db.begin().await.context("begin tx")?;
    let Some(owner) = lock_beat_owner(&mut tx, beat_id).await? else {
        return Ok(Change::BeatNotFound);
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO likes (user_id, beat_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, beat_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(beat_id)
    .execute(&mut *tx)
    .await
    .context("insert like")?
    .rows_affected();
    if inserted == 0 {
        return Ok(Change::Unchanged);
    }

    bump_like_counters(&mut tx, beat_id, owner, 1).await?;
    tx.commit().await.context("commit tx")?;
    Ok(Change::Applied)
}

pub async fn unlike(db: &PgPool, user_id: i32, beat_id: i32) -> anyhow::Result<Change> {
    let mut tx = db.begin().await.context("begin tx")?;
    let Some(owner) = lock_beat_owner(&mut tx, beat_id).await? else {
        return Ok(Change::BeatNotFound);
    };

    let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND beat_id = $2")
        .bind(user_id)
        .bind(beat_id)
        .execute(&mut *tx)
        .await
        .context("delete like")?
        .rows_affected();
    if deleted == 0 {
        return Ok(Change::Unchanged);
    }

    bump_like_counters(&mut tx, beat_id, owner, -1).await?;
    tx.commit().await.context("commit tx")?;
    Ok(Change::Applied)
}

pub async fn add_to_cart(db: &PgPool, user_id: i32, beat_id: i32) -> anyhow::Result<Change> {
    let exists: Option<i32> = sqlx::query_scalar("SELECT beat_id FROM beats WHERE beat_id = $1")
        .bind(beat_id)
        .fetch_optional(db)
        .await
        .context("check beat")?;
    if exists.is_none() {
        return Ok(Change::BeatNotFound);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO carts (user_id, beat_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, beat_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(beat_id)
    .execute(db)
    .await
    .context("insert cart item")?
    .rows_affected();

    Ok(if inserted == 0 {
        Change::Unchanged
    } else {
        Change::Applied
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(db: &PgPool, email: &str) -> i32 {
        sqlx::query_scalar(
            "INSERT INTO users (email, username, hashed_password) VALUES ($1, $1, 'x') RETURNING user_id",
        )
        .bind(email)
        .fetch_one(db)
        .await
        .unwrap()
    }

    async fn beat(db: &PgPool, owner: i32) -> i32 {
        sqlx::query_scalar(
            r#"
            INSERT INTO beats (user_id, title, price, bpm, audio_file)
            VALUES ($1, 'loop', 1000, 90, 'loop.mp3')
            RETURNING beat_id
            "#,
        )
        .bind(owner)
        .fetch_one(db)
        .await
        .unwrap()
    }

    /// (beat likes_count, owner total_likes)
    async fn like_counters(db: &PgPool, beat_id: i32, owner: i32) -> (i32, i32) {
        let beat_likes = sqlx::query_scalar("SELECT likes_count FROM beats WHERE beat_id = $1")
            .bind(beat_id)
            .fetch_one(db)
            .await
            .unwrap();
        let owner_likes = sqlx::query_scalar("SELECT total_likes FROM users WHERE user_id = $1")
            .bind(owner)
            .fetch_one(db)
            .await
            .unwrap();
        (beat_likes, owner_likes)
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn like_bumps_beat_and_owner_once(db: PgPool) {
        let owner = user(&db, "owner@x.com").await;
        let fan = user(&db, "fan@x.com").await;
        let beat_id = beat(&db, owner).await;

        assert_eq!(like(&db, fan, beat_id).await.unwrap(), Change::Applied);
        assert_eq!(like_counters(&db, beat_id, owner).await, (1, 1));

        assert_eq!(like(&db, fan, beat_id).await.unwrap(), Change::Unchanged);
        assert_eq!(like_counters(&db, beat_id, owner).await, (1, 1));

        let liked = list_liked(&db, fan).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].track.beat_id, beat_id);
        assert_eq!(liked[0].track.username, "owner@x.com");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn unlike_reverts_counters(db: PgPool) {
        let owner = user(&db, "owner@x.com").await;
        let fan = user(&db, "fan@x.com").await;
        let beat_id = beat(&db, owner).await;

        assert_eq!(unlike(&db, fan, beat_id).await.unwrap(), Change::Unchanged);

        like(&db, fan, beat_id).await.unwrap();
        assert_eq!(unlike(&db, fan, beat_id).await.unwrap(), Change::Applied);
        assert_eq!(like_counters(&db, beat_id, owner).await, (0, 0));
        assert!(list_liked(&db, fan).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn writes_on_unknown_beat_report_not_found(db: PgPool) {
        let fan = user(&db, "fan@x.com").await;
        assert_eq!(like(&db, fan, 999).await.unwrap(), Change::BeatNotFound);
        assert_eq!(unlike(&db, fan, 999).await.unwrap(), Change::BeatNotFound);
        assert_eq!(add_to_cart(&db, fan, 999).await.unwrap(), Change::BeatNotFound);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn cart_holds_each_beat_once(db: PgPool) {
        let owner = user(&db, "owner@x.com").await;
        let fan = user(&db, "fan@x.com").await;
        let beat_id = beat(&db, owner).await;

        assert_eq!(add_to_cart(&db, fan, beat_id).await.unwrap(), Change::Applied);
        assert_eq!(add_to_cart(&db, fan, beat_id).await.unwrap(), Change::Unchanged);

        let cart = list_cart(&db, fan).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].track.user_id, owner);
        assert_eq!(cart[0].track.username, "owner@x.com");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn profile_and_tracks_read_back(db: PgPool) {
        let owner = user(&db, "owner@x.com").await;
        let beat_id = beat(&db, owner).await;

        let profile = get_profile(&db, owner).await.unwrap().expect("profile");
        assert_eq!(profile.email, "owner@x.com");
        assert_eq!(profile.total_likes, 0);
        assert!(get_profile(&db, owner + 100).await.unwrap().is_none());

        let tracks = list_tracks(&db, owner).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].beat_id, beat_id);
    }
}
