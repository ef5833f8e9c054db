use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::debug;

use super::claims::Claims;
use crate::config::AuthConfig;

/// Turns a user id into a session token and back.
pub trait Strategy: Send + Sync {
    fn write_token(&self, user_id: i32) -> anyhow::Result<String>;
    /// `None` for any token that is malformed, forged or expired.
    fn read_token(&self, token: &str) -> Option<i32>;
}

/// Stateless HS256 tokens; validity is signature plus expiry.
#[derive(Clone)]
pub struct JwtStrategy {
    encoding: EncodingKey,
    decoding: DecodingKey,
    audience: String,
    lifetime_seconds: i64,
    leeway_seconds: i64,
}

impl JwtStrategy {
    pub fn new(secret: &str, audience: &str, lifetime_seconds: i64, leeway_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.to_string(),
            lifetime_seconds,
            leeway_seconds,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            &cfg.secret,
            &cfg.audience,
            cfg.lifetime_seconds,
            cfg.leeway_seconds,
        )
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation.leeway = self.leeway_seconds as u64;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;

        // jsonwebtoken accepts exp == now; expiry is exclusive here.
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if now >= data.claims.exp + self.leeway_seconds {
            anyhow::bail!("token expired");
        }
        Ok(data.claims)
    }
}

impl Strategy for JwtStrategy {
    fn write_token(&self, user_id: i32) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.lifetime_seconds,
        };
        let token = self.sign(&claims)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    fn read_token(&self, token: &str) -> Option<i32> {
        match self.verify(token) {
            Ok(claims) => claims.sub.parse().ok(),
            Err(e) => {
                debug!(error = %e, "jwt rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(secret: &str) -> JwtStrategy {
        JwtStrategy::new(secret, "beatstore:auth", 3600, 0)
    }

    #[test]
    fn issued_token_reads_back_user_id() {
        let s = strategy("dev-secret");
        let token = s.write_token(42).expect("sign");
        assert_eq!(s.read_token(&token), Some(42));
    }

    #[test]
    fn token_is_three_dot_separated_segments() {
        let token = strategy("dev-secret").write_token(7).expect("sign");
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts
            .iter()
            .all(|p| !p.is_empty()
                && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = strategy("secret-a").write_token(1).expect("sign");
        assert_eq!(strategy("secret-b").read_token(&token), None);
    }

    #[test]
    fn rejects_other_audience() {
        let token = JwtStrategy::new("same", "other:aud", 3600, 0)
            .write_token(1)
            .expect("sign");
        assert_eq!(strategy("same").read_token(&token), None);
    }

    #[test]
    fn rejects_garbage() {
        let s = strategy("dev-secret");
        assert_eq!(s.read_token("wrong_token"), None);
        assert_eq!(s.read_token(""), None);
        assert_eq!(s.read_token("a.b.c"), None);
    }

    #[test]
    fn token_is_invalid_at_expiry() {
        let s = JwtStrategy::new("dev-secret", "beatstore:auth", 0, 0);
        let token = s.write_token(1).expect("sign");
        assert_eq!(s.read_token(&token), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let s = strategy("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = s
            .sign(&Claims {
                sub: "1".into(),
                aud: "beatstore:auth".into(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .expect("sign");
        assert_eq!(s.read_token(&token), None);
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let s = JwtStrategy::new("dev-secret", "beatstore:auth", 3600, 30);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = s
            .sign(&Claims {
                sub: "5".into(),
                aud: "beatstore:auth".into(),
                iat: now - 3610,
                exp: now - 10,
            })
            .expect("sign");
        assert_eq!(s.read_token(&token), Some(5));
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let s = strategy("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = s
            .sign(&Claims {
                sub: "not-a-number".into(),
                aud: "beatstore:auth".into(),
                iat: now,
                exp: now + 60,
            })
            .expect("sign");
        assert_eq!(s.read_token(&token), None);
    }
}
