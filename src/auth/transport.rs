use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::config::AuthConfig;

/// Carries a session token between client and server.
pub trait Transport: Send + Sync {
    fn read_token(&self, headers: &HeaderMap) -> Option<String>;
    fn login_response(&self, token: String) -> Response;
    fn logout_response(&self) -> Response;
}

#[derive(Debug, Clone)]
pub struct CookieTransport {
    name: String,
    max_age_seconds: i64,
    secure: bool,
    same_site: SameSite,
}

impl CookieTransport {
    pub fn new(name: &str, max_age_seconds: i64, secure: bool, same_site: SameSite) -> Self {
        Self {
            name: name.to_string(),
            max_age_seconds,
            secure,
            same_site,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            &cfg.cookie_name,
            cfg.lifetime_seconds,
            cfg.cookie_secure,
            cfg.cookie_same_site,
        )
    }

    fn cookie(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(max_age)
            .build()
    }
}

impl Transport for CookieTransport {
    fn read_token(&self, headers: &HeaderMap) -> Option<String> {
        CookieJar::from_headers(headers)
            .get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn login_response(&self, token: String) -> Response {
        let cookie = self.cookie(token, Duration::seconds(self.max_age_seconds));
        (CookieJar::new().add(cookie), StatusCode::NO_CONTENT).into_response()
    }

    fn logout_response(&self) -> Response {
        let mut cookie = self.cookie(String::new(), Duration::ZERO);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        (CookieJar::new().add(cookie), StatusCode::NO_CONTENT).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};

    fn transport() -> CookieTransport {
        CookieTransport::new("beats", 3600, true, SameSite::Lax)
    }

    fn set_cookie(res: &Response) -> String {
        res.headers()
            .get(SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn login_sets_session_cookie() {
        let res = transport().login_response("a.b.c".into());
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let header = set_cookie(&res);
        assert!(header.starts_with("beats=a.b.c"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=3600"));
    }

    #[test]
    fn logout_expires_cookie() {
        let res = transport().logout_response();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let header = set_cookie(&res);
        assert!(header.starts_with("beats=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("1970"));
    }

    #[test]
    fn reads_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; beats=x.y.z".parse().unwrap());
        assert_eq!(transport().read_token(&headers), Some("x.y.z".to_string()));
    }

    #[test]
    fn missing_or_empty_cookie_reads_none() {
        let headers = HeaderMap::new();
        assert_eq!(transport().read_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "beats=".parse().unwrap());
        assert_eq!(transport().read_token(&headers), None);
    }
}
