//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views read a snapshot of [`AuthState`] to decide what the header menu
//! shows; anything that needs to react to sign-in or sign-out subscribes to
//! the store. Every mutation is one atomic update followed by one
//! notification to subscribers.
//!
//! Overlapping `refresh_user`/`logout` calls are not deduplicated: whichever
//! settles last determines the final state.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use common::SerializedUser;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::net::api::{ClientError, UserApi};

/// What the client knows about the signed-in user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UserState {
    /// No answer from the server yet.
    #[default]
    Unchecked,
    LoggedOut,
    LoggedIn(SerializedUser),
}

impl UserState {
    #[must_use]
    pub fn from_user(user: Option<SerializedUser>) -> Self {
        user.map_or(Self::LoggedOut, Self::LoggedIn)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: UserState,
    pub user_loading: bool,
    pub user_error: Option<String>,
}

/// Auth portion of the hydration payload the server embeds in the page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialAuthData {
    #[serde(default)]
    pub user: Option<SerializedUser>,
}

impl From<InitialAuthData> for AuthState {
    /// The server resolved the session before rendering, so an absent user
    /// means signed out rather than unchecked.
    fn from(data: InitialAuthData) -> Self {
        Self { user: UserState::from_user(data.user), ..Self::default() }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct AuthStore {
    api: Arc<dyn UserApi>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    /// Store with no knowledge of the user yet.
    #[must_use]
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        Self::with_state(api, AuthState::default())
    }

    /// Store seeded from the server's hydration payload.
    #[must_use]
    pub fn hydrate(api: Arc<dyn UserApi>, data: InitialAuthData) -> Self {
        Self::with_state(api, AuthState::from(data))
    }

    fn with_state(api: Arc<dyn UserApi>, state: AuthState) -> Self {
        Self { api, state: watch::Sender::new(state) }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every update from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Ask the server who is signed in.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording its message in `user_error`.
    pub async fn refresh_user(&self) -> Result<Option<SerializedUser>, ClientError> {
        self.begin();
        match self.api.get_logged_in_user().await {
            Ok(user) => {
                self.settle(UserState::from_user(user.clone()));
                Ok(user)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// End the server session and forget the user.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording its message in `user_error`;
    /// the user is left unchanged.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.begin();
        match self.api.logout().await {
            Ok(()) => {
                self.settle(UserState::LoggedOut);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.user_loading = true;
            s.user_error = None;
        });
    }

    fn settle(&self, user: UserState) {
        self.state.send_modify(|s| {
            s.user = user;
            s.user_loading = false;
        });
    }

    fn fail(&self, err: ClientError) -> ClientError {
        tracing::warn!(error = %err, "auth request failed");
        self.state.send_modify(|s| {
            s.user_loading = false;
            s.user_error = Some(err.to_string());
        });
        err
    }
}
