//! Header menu: sign-in link, sign-out action, or a loading marker.

#[cfg(test)]
#[path = "menu_test.rs"]
mod menu_test;

use crate::state::auth::{AuthState, UserState};

pub const SIGN_IN_HREF: &str = "/register";
pub const SIGN_OUT_HREF: &str = "#signOut";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderMenu {
    /// Signed in and an auth call is in flight.
    Loading,
    SignOut,
    /// Not signed in, or not known yet.
    SignIn { href: &'static str },
}

impl HeaderMenu {
    #[must_use]
    pub fn from_state(state: &AuthState) -> Self {
        match (&state.user, state.user_loading) {
            (UserState::LoggedIn(_), true) => Self::Loading,
            (UserState::LoggedIn(_), false) => Self::SignOut,
            (UserState::Unchecked | UserState::LoggedOut, _) => Self::SignIn { href: SIGN_IN_HREF },
        }
    }

    #[must_use]
    pub fn render(self) -> String {
        match self {
            Self::Loading => r#"<li class="menu-item" data-key="signOut"><em>Loading…</em></li>"#.to_owned(),
            Self::SignOut => format!(
                r#"<li class="menu-item" data-key="signOut"><a href="{SIGN_OUT_HREF}" data-action="logout">Sign out</a></li>"#
            ),
            Self::SignIn { href } => {
                format!(r#"<li class="menu-item" data-key="signIn"><a href="{href}">Sign in or register</a></li>"#)
            }
        }
    }
}
