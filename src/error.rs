use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::manager::ManagerError;

/// Error returned by every route handler; rendered as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid password: {reason}")]
    InvalidPassword { reason: String },

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("bad credentials")]
    BadCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidPassword { .. }
            | ApiError::UserAlreadyExists
            | ApiError::BadCredentials
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> serde_json::Value {
        match self {
            ApiError::Validation(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg) => json!(msg),
            ApiError::InvalidPassword { reason } => json!({
                "code": "REGISTER_INVALID_PASSWORD",
                "reason": reason,
            }),
            ApiError::UserAlreadyExists => json!("REGISTER_USER_ALREADY_EXISTS"),
            ApiError::BadCredentials => json!("LOGIN_BAD_CREDENTIALS"),
            ApiError::Unauthorized => json!("Unauthorized"),
            ApiError::Internal(_) => json!("Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<ManagerError> for ApiError {
    fn from(e: ManagerError) -> Self {
        match e {
            ManagerError::InvalidPassword { reason } => ApiError::InvalidPassword { reason },
            ManagerError::UserAlreadyExists => ApiError::UserAlreadyExists,
            ManagerError::BadCredentials => ApiError::BadCredentials,
            ManagerError::Internal(e) => ApiError::Internal(e),
        }
    }
}

/// Collapses any extractor rejection (`Json`, `Form`, `Query`, `Path`) into a 422.
pub fn rejected<R: std::fmt::Display>(rejection: R) -> ApiError {
    ApiError::Validation(rejection.to_string())
}
