use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    routing::post,
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterRequest},
        extractors::CurrentUser,
        manager::UserCreate,
    },
    error::{rejected, ApiError},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let Json(payload) = payload.map_err(rejected)?;
    let email = payload.email.trim().to_string();

    if !is_valid_email(&email) {
        return Err(ApiError::Validation("value is not a valid email address".into()));
    }
    if payload.username.trim().is_empty() {
        return Err(ApiError::Validation("username must not be empty".into()));
    }

    let user = state
        .users
        .create(UserCreate {
            email,
            password: payload.password,
            username: payload.username,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form.map_err(rejected)?;

    let user = state
        .users
        .authenticate(form.username.trim(), &form.password)
        .await?;

    let response = state.auth.login(user.id)?;
    info!(user_id = user.id, backend = state.auth.name, "user logged in");
    Ok(response)
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Response {
    info!(user_id = user.id, "user logged out");
    state.auth.logout()
}
