use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    dto::{FeedQuery, PAGE_SIZE},
    repo_types::{TrackCard, TRACK_CARD_SELECT},
};

pub async fn trending(db: &PgPool, limit: i64) -> anyhow::Result<Vec<TrackCard>> {
    let rows = sqlx::query_as::<_, TrackCard>(&format!(
        "{TRACK_CARD_SELECT} ORDER BY b.likes_count DESC, b.beat_id ASC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list trending beats")?;
    Ok(rows)
}

pub async fn feed(db: &PgPool, q: &FeedQuery, offset: i64) -> anyhow::Result<Vec<TrackCard>> {
    let mut qb = feed_query(q, offset);
    let rows = qb
        .build_query_as::<TrackCard>()
        .fetch_all(db)
        .await
        .context("list beat feed")?;
    Ok(rows)
}

pub(crate) fn feed_query(q: &FeedQuery, offset: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(TRACK_CARD_SELECT);
    qb.push(" WHERE TRUE");

    if let Some(bpm) = q.bpm {
        qb.push(" AND b.bpm = ").push_bind(bpm);
    }
    if let Some(low) = q.lowest_price {
        qb.push(" AND b.price >= ").push_bind(low);
    }
    if let Some(high) = q.highest_price {
        qb.push(" AND b.price <= ").push_bind(high);
    }
    push_ilike_any(&mut qb, "b.mood", &q.moods);
    push_ilike_any(&mut qb, "b.genre", &q.genres);
    push_ilike_any(&mut qb, "b.tags", &q.tags);

    qb.push(" ORDER BY b.added_at DESC, b.beat_id DESC LIMIT ")
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}

/// `AND (col ILIKE '%a%' OR col ILIKE '%b%')`; blank values are skipped.
fn push_ilike_any(qb: &mut QueryBuilder<'static, Postgres>, column: &str, values: &[String]) {
    let values: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return;
    }

    qb.push(" AND (");
    {
        let mut any = qb.separated(" OR ");
        for v in values {
            any.push(format!("{column} ILIKE "));
            any.push_bind_unseparated(format!("%{}%", escape_like(v)));
        }
    }
    qb.push(")");
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Records a play and bumps the beat and owner counters.
/// Returns `false` when the beat does not exist.
pub async fn record_play(db: &PgPool, beat_id: i32, user_id: Option<i32>) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin tx")?;

    let owner: Option<i32> =
        sqlx::query_scalar("SELECT user_id FROM beats WHERE beat_id = $1 FOR UPDATE")
            .bind(beat_id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock beat")?;
    let Some(owner) = owner else {
        return Ok(false);
    };

    sqlx::query("INSERT INTO beat_plays (user_id, beat_id) VALUES ($1, $2)")
        .bind(user_id) // Option<i32> → NULL for anonymous plays
        .bind(beat_id)
        .execute(&mut *tx)
        .await
        .context("insert play")?;

    sqlx::query("UPDATE beats SET plays_count = plays_count + 1 WHERE beat_id = $1")
        .bind(beat_id)
        .execute(&mut *tx)
        .await
        .context("bump beat plays")?;

    sqlx::query("UPDATE users SET total_plays = total_plays + 1 WHERE user_id = $1")
        .bind(owner)
        .execute(&mut *tx)
        .await
        .context("bump owner plays")?;

    tx.commit().await.context("commit tx")?;
    Ok(true)
}
