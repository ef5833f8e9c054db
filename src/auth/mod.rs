use crate::state::AppState;
use axum::Router;

pub mod backend;
mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod manager;
#[cfg(test)]
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod transport;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
