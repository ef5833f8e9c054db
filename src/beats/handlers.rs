use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{Query, QueryRejection};
use tracing::{debug, instrument};

use super::{
    dto::{FeedQuery, TrendingQuery},
    repo,
    repo_types::TrackCard,
};
use crate::{
    error::{rejected, ApiError},
    state::AppState,
};

pub fn beat_routes() -> Router<AppState> {
    Router::new()
        .route("/beat/trending", get(trending))
        .route("/beat/feed", get(feed))
        .route("/beat/:beat_id/play", post(record_play))
}

#[instrument(skip(state, q))]
pub async fn trending(
    State(state): State<AppState>,
    q: Result<Query<TrendingQuery>, QueryRejection>,
) -> Result<Json<Vec<TrackCard>>, ApiError> {
    let Query(q) = q.map_err(rejected)?;
    let tracks = repo::trending(&state.db, q.clamped_limit()).await?;
    if tracks.is_empty() {
        return Err(ApiError::NotFound("No tracks available".into()));
    }
    Ok(Json(tracks))
}

#[instrument(skip(state, q))]
pub async fn feed(
    State(state): State<AppState>,
    q: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Json<Vec<TrackCard>>, ApiError> {
    let Query(q) = q.map_err(rejected)?;
    let Some(offset) = q.offset() else {
        return Err(ApiError::Validation(
            "page must be a positive number within range".into(),
        ));
    };

    let tracks = repo::feed(&state.db, &q, offset).await?;
    debug!(count = tracks.len(), page = q.page, "feed loaded");
    if tracks.is_empty() {
        return Err(ApiError::NotFound("No tracks found".into()));
    }
    Ok(Json(tracks))
}

/// Anonymous plays are allowed; a valid session attributes the play.
#[instrument(skip(state, headers, beat_id))]
pub async fn record_play(
    State(state): State<AppState>,
    headers: HeaderMap,
    beat_id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(beat_id) = beat_id.map_err(rejected)?;

    let user_id = match state.auth.authenticate(&headers) {
        Some(id) => state
            .users
            .get(id)
            .await?
            .filter(|u| u.is_active)
            .map(|u| u.id),
        None => None,
    };

    if !repo::record_play(&state.db, beat_id, user_id).await? {
        return Err(ApiError::NotFound("Beat not found".into()));
    }
    debug!(beat_id, ?user_id, "play recorded");
    Ok(StatusCode::NO_CONTENT)
}
