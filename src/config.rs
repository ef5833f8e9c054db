use anyhow::Context;
use axum_extra::extract::cookie::SameSite;

/// Settings for token issuance and the session cookie.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub lifetime_seconds: i64,
    pub leeway_seconds: i64,
    pub audience: String,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

const MAX_LEEWAY_SECONDS: i64 = 30;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = lookup("SECRET_KEY").unwrap_or_default();
        anyhow::ensure!(!secret.trim().is_empty(), "SECRET_KEY must be set and non-empty");

        let lifetime_seconds: i64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_SECONDS", 3600)?;
        anyhow::ensure!(lifetime_seconds > 0, "ACCESS_TOKEN_EXPIRE_SECONDS must be positive");

        let leeway_seconds: i64 = parse_or(&lookup, "TOKEN_LEEWAY_SECONDS", 0)?;
        anyhow::ensure!(
            (0..=MAX_LEEWAY_SECONDS).contains(&leeway_seconds),
            "TOKEN_LEEWAY_SECONDS must be between 0 and {MAX_LEEWAY_SECONDS}"
        );

        let cookie_same_site = match lookup("COOKIE_SAMESITE")
            .unwrap_or_else(|| "lax".into())
            .to_lowercase()
            .as_str()
        {
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            other => anyhow::bail!("unknown COOKIE_SAMESITE value: {other}"),
        };

        let auth = AuthConfig {
            secret,
            lifetime_seconds,
            leeway_seconds,
            audience: lookup("TOKEN_AUDIENCE").unwrap_or_else(|| "beatstore:auth".into()),
            cookie_name: lookup("COOKIE_NAME").unwrap_or_else(|| "beats".into()),
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", true)?,
            cookie_same_site,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://127.0.0.1:5500".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            cors_origins,
            auth,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v.trim().parse::<T>().with_context(|| format!("invalid {key}")),
        None => Ok(default),
    }
}
