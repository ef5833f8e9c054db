use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CartTrackCard, LikedTrackCard, MessageResponse, UserProfile},
    repo::{self, Change},
};
use crate::{
    auth::extractors::CurrentUser,
    beats::repo_types::TrackCard,
    error::{rejected, ApiError},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:user_id", get(get_profile))
        .route("/user/:user_id/tracks", get(get_tracks))
        .route("/user/:user_id/cart", get(get_cart))
        .route("/user/:user_id/liked", get(get_liked))
        .route(
            "/user/:user_id/like/:beat_id",
            post(like_beat).delete(unlike_beat),
        )
        .route("/user/:user_id/cart/:beat_id", post(add_to_cart))
}

fn non_empty<T>(rows: Vec<T>) -> Result<Json<Vec<T>>, ApiError> {
    if rows.is_empty() {
        return Err(ApiError::NotFound(
            "User not found or no tracks available".into(),
        ));
    }
    Ok(Json(rows))
}

/// Writes on behalf of `user_id` are only allowed for that user.
fn ensure_self(current: &CurrentUser, user_id: i32) -> Result<(), ApiError> {
    if current.0.id != user_id {
        return Err(ApiError::Forbidden(
            "Not authorized to perform action for this user".into(),
        ));
    }
    Ok(())
}

fn outcome(
    change: Change,
    applied: &'static str,
    unchanged: ApiError,
) -> Result<Json<MessageResponse>, ApiError> {
    match change {
        Change::Applied => Ok(Json(MessageResponse { message: applied })),
        Change::Unchanged => Err(unchanged),
        Change::BeatNotFound => Err(ApiError::NotFound("Beat not found".into())),
    }
}

fn like_outcome(change: Change) -> Result<Json<MessageResponse>, ApiError> {
    outcome(
        change,
        "Beat liked successfully",
        ApiError::BadRequest("Already liked this beat".into()),
    )
}

fn unlike_outcome(change: Change) -> Result<Json<MessageResponse>, ApiError> {
    outcome(
        change,
        "Beat unliked successfully",
        ApiError::NotFound("Like not found".into()),
    )
}

fn cart_outcome(change: Change) -> Result<Json<MessageResponse>, ApiError> {
    outcome(
        change,
        "Beat added to cart",
        ApiError::BadRequest("Already in cart".into()),
    )
}

#[instrument(skip(state, path))]
pub async fn get_profile(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Path(user_id) = path.map_err(rejected)?;
    repo::get_profile(&state.db, user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

#[instrument(skip(state, path))]
pub async fn get_tracks(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<TrackCard>>, ApiError> {
    let Path(user_id) = path.map_err(rejected)?;
    non_empty(repo::list_tracks(&state.db, user_id).await?)
}

#[instrument(skip(state, path))]
pub async fn get_cart(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<CartTrackCard>>, ApiError> {
    let Path(user_id) = path.map_err(rejected)?;
    non_empty(repo::list_cart(&state.db, user_id).await?)
}

#[instrument(skip(state, path))]
pub async fn get_liked(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<LikedTrackCard>>, ApiError> {
    let Path(user_id) = path.map_err(rejected)?;
    non_empty(repo::list_liked(&state.db, user_id).await?)
}

#[instrument(skip(state, current, path))]
pub async fn like_beat(
    State(state): State<AppState>,
    current: CurrentUser,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path((user_id, beat_id)) = path.map_err(rejected)?;
    ensure_self(&current, user_id)?;

    let change = repo::like(&state.db, user_id, beat_id).await?;
    if change == Change::Applied {
        info!(user_id, beat_id, "beat liked");
    }
    like_outcome(change)
}

#[instrument(skip(state, current, path))]
pub async fn unlike_beat(
    State(state): State<AppState>,
    current: CurrentUser,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path((user_id, beat_id)) = path.map_err(rejected)?;
    ensure_self(&current, user_id)?;

    let change = repo::unlike(&state.db, user_id, beat_id).await?;
    if change == Change::Applied {
        info!(user_id, beat_id, "beat unliked");
    }
    unlike_outcome(change)
}

#[instrument(skip(state, current, path))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    current: CurrentUser,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path((user_id, beat_id)) = path.map_err(rejected)?;
    ensure_self(&current, user_id)?;

    let change = repo::add_to_cart(&state.db, user_id, beat_id).await?;
    if change == Change::Applied {
        info!(user_id, beat_id, "beat added to cart");
    }
    cart_outcome(change)
}
