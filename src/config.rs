//! Process configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` (if present) and then builds one `AppConfig` before
//! anything else starts. The session secret has no default: the server
//! refuses to start without one.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 31987;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 14;
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;
pub const DEFAULT_SESSION_PURGE_SECS: u64 = 900;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("SESSION_SECRET must be at least {} characters", MIN_SESSION_SECRET_LEN)]
    WeakSessionSecret,
}

/// Deployment mode. Controls how much error detail reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "production" | "prod") => Ok(Self::Production),
            Some("development" | "dev") => Ok(Self::Development),
            Some(other) => Err(ConfigError::Invalid { var: "APP_ENV", value: other.to_owned() }),
        }
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub environment: Environment,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub session_purge_interval: Duration,
    pub cookie_secure: bool,
    pub public_dir: PathBuf,
    pub request_log: bool,
    pub log_path: Option<PathBuf>,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    /// - `SESSION_SECRET` (at least 32 characters)
    ///
    /// Optional:
    /// - `PORT`: default 31987
    /// - `APP_ENV`: `production` (default) or `development`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `SESSION_TTL_HOURS`: default 336, between 1 and 87600
    /// - `SESSION_PURGE_SECS`: default 900
    /// - `COOKIE_SECURE`, `REQUEST_LOG`: booleans, default false
    /// - `PUBLIC_DIR`: default `public`
    /// - `LOG_PATH`: also write logs to this file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required value is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let session_secret = lookup("SESSION_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.chars().count() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::WeakSessionSecret);
        }

        let session_ttl = session_ttl(parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?)?;
        let purge_secs = parse_or(&lookup, "SESSION_PURGE_SECS", DEFAULT_SESSION_PURGE_SECS)?;

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            environment: Environment::parse(lookup("APP_ENV").as_deref())?,
            session_secret,
            session_ttl,
            session_purge_interval: Duration::from_secs(purge_secs.max(1)),
            cookie_secure: bool_or(&lookup, "COOKIE_SECURE", false)?,
            public_dir: lookup("PUBLIC_DIR").map_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR), PathBuf::from),
            request_log: bool_or(&lookup, "REQUEST_LOG", false)?,
            log_path: lookup("LOG_PATH").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
        })
    }
}

/// Session lifetime must be at least an hour and at most
/// [`MAX_SESSION_TTL_HOURS`].
fn session_ttl(hours: u64) -> Result<Duration, ConfigError> {
    Some(hours)
        .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
        .and_then(|h| h.checked_mul(3600))
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid { var: "SESSION_TTL_HOURS", value: hours.to_string() })
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_or<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { var, value: raw }),
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
