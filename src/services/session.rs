//! Server-side session records.
//!
//! ARCHITECTURE
//! ============
//! The browser holds a signed cookie containing an opaque token; the
//! `sessions` table maps that token to a user until `expires_at`. A row is
//! written only on login or registration, so anonymous visitors never create
//! session state.
//!
//! Concurrent requests under one token read and write the row independently;
//! the last write wins.

use std::fmt::Write;
use std::time::Duration;

use rand::Rng;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::user::User;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Token shape check so garbage cookie values never reach the database.
#[must_use]
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == 64 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Create a session for the given user, returning the token.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_session(pool: &PgPool, user_id: i64, ttl: Duration) -> Result<String, sqlx::Error> {
    let token = generate_token();
    sqlx::query(
        "INSERT INTO sessions (token, user_id, expires_at)
         VALUES ($1, $2, now() + make_interval(secs => $3))",
    )
    .bind(&token)
    .bind(user_id)
    .bind(ttl.as_secs_f64())
    .execute(pool)
    .await?;
    Ok(token)
}

/// Resolve a token to its user. Unknown, expired and malformed tokens all
/// resolve to `None`.
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn load_session_user(pool: &PgPool, token: &str) -> Result<Option<User>, sqlx::Error> {
    if !is_well_formed_token(token) {
        return Ok(None);
    }

    let row = sqlx::query(
        r"SELECT u.id, u.account_id, u.email, u.username, u.password,
                 u.activation_key, u.activated, u.api_element_modify_time
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(User::from_row))
}

/// Delete a session by token.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every expired session, returning how many rows were removed.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Spawn the background task that purges expired sessions every `interval`.
pub fn spawn_session_reaper(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match purge_expired_sessions(&pool).await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "purged expired sessions"),
                Err(e) => error!(error = %e, "session purge failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
