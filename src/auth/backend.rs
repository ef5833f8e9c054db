use std::sync::Arc;

use axum::{http::HeaderMap, response::Response};
use tracing::debug;

use super::{
    jwt::{JwtStrategy, Strategy},
    transport::{CookieTransport, Transport},
};
use crate::config::AuthConfig;

/// Pairs a transport with a token strategy.
#[derive(Clone)]
pub struct AuthBackend {
    pub name: &'static str,
    transport: Arc<dyn Transport>,
    strategy: Arc<dyn Strategy>,
}

impl AuthBackend {
    pub fn new(
        name: &'static str,
        transport: Arc<dyn Transport>,
        strategy: Arc<dyn Strategy>,
    ) -> Self {
        Self {
            name,
            transport,
            strategy,
        }
    }

    /// Cookie transport + JWT strategy.
    pub fn cookie_jwt(cfg: &AuthConfig) -> Self {
        Self::new(
            "jwt",
            Arc::new(CookieTransport::from_config(cfg)),
            Arc::new(JwtStrategy::from_config(cfg)),
        )
    }

    pub fn login(&self, user_id: i32) -> anyhow::Result<Response> {
        let token = self.strategy.write_token(user_id)?;
        debug!(backend = self.name, user_id, "session issued");
        Ok(self.transport.login_response(token))
    }

    pub fn logout(&self) -> Response {
        self.transport.logout_response()
    }

    /// User id carried by the request, if it presents a valid token.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<i32> {
        let token = self.transport.read_token(headers)?;
        self.strategy.read_token(&token)
    }
}
