//! User model: validation, password hashing, persistence.
//!
//! DESIGN
//! ======
//! Format rules are checked here before touching the database; uniqueness is
//! left to the `users_email_key` / `users_username_key` constraints and the
//! resulting unique violations are translated back into the same
//! user-facing validation messages. Password hashes never leave this module
//! except through the `password` column.

use std::fmt;
use std::sync::OnceLock;

use common::SerializedUser;
use rand::Rng;
use regex::Regex;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub const BCRYPT_COST: u32 = 10;
pub const EMAIL_MAX_LEN: usize = 128;
pub const USERNAME_MAX_LEN: usize = 30;
pub const ACTIVATION_KEY_LEN: usize = 8;
const ACTIVATION_KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const EMAIL_TAKEN: &str = "There already is a user with this email address; please sign in instead";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const USERNAME_TAKEN: &str = "There already is a user with this username; please pick another one";
pub const USERNAME_REQUIRED: &str = "A username is required";
pub const USERNAME_PATTERN: &str =
    "Your username must only contain numbers, letters, and dashes (-) and be at least 2 characters long";
pub const PASSWORD_REQUIRED: &str = "A password is required";

const EMAIL_CONSTRAINT: &str = "users_email_key";
const USERNAME_CONSTRAINT: &str = "users_username_key";

const USER_COLUMNS: &str = "id, account_id, email, username, password, activation_key, activated, api_element_modify_time";

// =============================================================================
// ERRORS
// =============================================================================

/// One or more user-facing validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    #[must_use]
    pub fn single(message: impl Into<String>) -> Self {
        Self { messages: vec![message.into()] }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("incorrect login or password")]
    InvalidCredentials,
    #[error("invalid activation key")]
    InvalidActivationKey,
    #[error("current password does not match")]
    IncorrectPassword,
    #[error("user not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match unique_violation_message(&err) {
            Some(message) => Self::Validation(ValidationError::single(message)),
            None => Self::Db(err),
        }
    }
}

/// Map a unique-constraint violation on `users` to its validation message.
fn unique_violation_message(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    if !db.is_unique_violation() {
        return None;
    }
    constraint_message(db.constraint())
}

pub(crate) fn constraint_message(constraint: Option<&str>) -> Option<&'static str> {
    match constraint? {
        EMAIL_CONSTRAINT => Some(EMAIL_TAKEN),
        USERNAME_CONSTRAINT => Some(USERNAME_TAKEN),
        _ => None,
    }
}

// =============================================================================
// MODEL
// =============================================================================

/// A persisted user row.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub account_id: i64,
    pub email: String,
    pub username: String,
    /// bcrypt hash.
    pub password: String,
    pub activation_key: String,
    pub activated: bool,
    /// Incremented on every mutation of the row.
    pub api_element_modify_time: i32,
}

impl User {
    /// Public projection sent to clients.
    #[must_use]
    pub fn serialize(&self) -> SerializedUser {
        SerializedUser {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            activated: self.activated,
        }
    }

    pub(crate) fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            account_id: row.get("account_id"),
            email: row.get("email"),
            username: row.get("username"),
            password: row.get("password"),
            activation_key: row.get("activation_key"),
            activated: row.get("activated"),
            api_element_modify_time: row.get("api_element_modify_time"),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("activated", &self.activated)
            .field("api_element_modify_time", &self.api_element_modify_time)
            .finish_non_exhaustive()
    }
}

/// Registration input.
#[derive(Clone, serde::Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl NewUser {
    /// Trim identifiers and lowercase the email. The password is kept verbatim.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_ascii_lowercase(),
            username: self.username.trim().to_owned(),
            password: self.password,
        }
    }

    /// Check every field, collecting all failure messages.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing each failing field's message.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let messages: Vec<String> = [
            validate_email(&self.email),
            validate_username(&self.username),
            validate_password(&self.password),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flat_map(|e| e.messages)
        .collect();

        if messages.is_empty() { Ok(()) } else { Err(ValidationError { messages }) }
    }
}

// =============================================================================
// VALIDATORS
// =============================================================================

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // `\w` restricted to ASCII; length is enforced separately.
        Regex::new("^[A-Za-z0-9_][A-Za-z0-9_-]*[A-Za-z0-9_]$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // local@label(.label)+ where no label is empty or starts/ends with a dash
        let label = r"[^\s@.\-](?:[^\s@.]*[^\s@.\-])?";
        Regex::new(&format!(r"^[^\s@]+@{label}(?:\.{label})+$"))
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Username must match `^\w[\w-]*\w$` and fit the column.
///
/// # Errors
///
/// Returns the required/pattern/length message that applies.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::single(USERNAME_REQUIRED));
    }
    if !username_regex().is_match(username) {
        return Err(ValidationError::single(USERNAME_PATTERN));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(ValidationError::single(format!(
            "Your username must be at most {USERNAME_MAX_LEN} characters long"
        )));
    }
    Ok(())
}

/// Email must look like `local@domain.tld` and fit the column.
///
/// # Errors
///
/// Returns the format or length message that applies.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(ValidationError::single(format!(
            "Your email address must be at most {EMAIL_MAX_LEN} characters long"
        )));
    }
    if email_regex().is_match(email) { Ok(()) } else { Err(ValidationError::single(EMAIL_INVALID)) }
}

/// # Errors
///
/// Returns [`PASSWORD_REQUIRED`] for an empty password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() { Err(ValidationError::single(PASSWORD_REQUIRED)) } else { Ok(()) }
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// bcrypt-hash a plaintext password at [`BCRYPT_COST`].
///
/// # Errors
///
/// Returns the underlying bcrypt error (e.g. the password contains a NUL byte).
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Check a plaintext password against a stored hash. A malformed hash never
/// matches.
#[must_use]
pub fn compare_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[must_use]
pub fn generate_activation_key() -> String {
    let mut rng = rand::rng();
    (0..ACTIVATION_KEY_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ACTIVATION_KEY_ALPHABET.len());
            char::from(ACTIVATION_KEY_ALPHABET[idx])
        })
        .collect()
}

fn normalize_activation_key(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Validate, hash and insert a new user.
///
/// # Errors
///
/// Returns [`UserError::Validation`] for format problems and for duplicate
/// email/username, or a hashing/database error.
pub async fn create_user(pool: &PgPool, new_user: NewUser) -> Result<User, UserError> {
    let new_user = new_user.normalized();
    new_user.validate()?;
    let hash = hash_password(&new_user.password)?;

    let row = sqlx::query(&format!(
        "INSERT INTO users (email, username, password, activation_key)
         VALUES ($1, $2, $3, $4)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&hash)
    .bind(generate_activation_key())
    .fetch_one(pool)
    .await?;

    Ok(User::from_row(&row))
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(User::from_row))
}

/// Look a user up by email (case-insensitive) or exact username.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
    let login = login.trim();
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2 LIMIT 1"
    ))
    .bind(login.to_ascii_lowercase())
    .bind(login)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(User::from_row))
}

/// Resolve login credentials to a user.
///
/// # Errors
///
/// Returns [`UserError::InvalidCredentials`] when the login is unknown or the
/// password does not match.
pub async fn authenticate(pool: &PgPool, login: &str, password: &str) -> Result<User, UserError> {
    let user = find_by_login(pool, login)
        .await?
        .ok_or(UserError::InvalidCredentials)?;
    if compare_password(password, &user.password) {
        Ok(user)
    } else {
        Err(UserError::InvalidCredentials)
    }
}

/// Flip `activated` when `key` matches the stored activation key. Activating
/// an already-active user is a no-op that returns the current row.
///
/// # Errors
///
/// Returns [`UserError::NotFound`] or [`UserError::InvalidActivationKey`].
pub async fn activate(pool: &PgPool, id: i64, key: &str) -> Result<User, UserError> {
    let user = find_by_id(pool, id).await?.ok_or(UserError::NotFound)?;
    if user.activated {
        return Ok(user);
    }
    if normalize_activation_key(key) != user.activation_key {
        return Err(UserError::InvalidActivationKey);
    }

    let row = sqlx::query(&format!(
        "UPDATE users
         SET activated = TRUE, api_element_modify_time = api_element_modify_time + 1
         WHERE id = $1
         RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(UserError::NotFound)?;

    Ok(User::from_row(&row))
}

/// Replace the password after verifying the current one.
///
/// # Errors
///
/// Returns [`UserError::Validation`] for an empty new password, or
/// [`UserError::IncorrectPassword`] when `current` does not match.
pub async fn change_password(pool: &PgPool, id: i64, current: &str, new_password: &str) -> Result<(), UserError> {
    validate_password(new_password)?;
    let user = find_by_id(pool, id).await?.ok_or(UserError::NotFound)?;
    if !compare_password(current, &user.password) {
        return Err(UserError::IncorrectPassword);
    }
    let hash = hash_password(new_password)?;

    sqlx::query(
        "UPDATE users
         SET password = $2, api_element_modify_time = api_element_modify_time + 1
         WHERE id = $1",
    )
    .bind(id)
    .bind(hash)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
