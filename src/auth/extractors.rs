use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::repo_types::User;
use crate::{error::ApiError, state::AppState};

/// The active user behind the session cookie; 401 otherwise.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = state
            .auth
            .authenticate(&parts.headers)
            .ok_or(ApiError::Unauthorized)?;

        match state.users.get(user_id).await? {
            Some(user) if user.is_active => Ok(CurrentUser(user)),
            Some(_) => {
                debug!(user_id, "token for inactive user");
                Err(ApiError::Unauthorized)
            }
            None => {
                debug!(user_id, "token for unknown user");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
