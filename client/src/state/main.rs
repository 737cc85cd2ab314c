//! Top-level store.
//!
//! Owns every sub-store and is handed to views by reference. The auth store
//! is currently its only member.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::auth::{AuthStore, InitialAuthData};
use crate::net::api::UserApi;

/// Hydration payload embedded in the server-rendered page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialData {
    #[serde(default)]
    pub auth: InitialAuthData,
}

pub struct MainStore {
    auth: AuthStore,
}

impl MainStore {
    #[must_use]
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        Self { auth: AuthStore::new(api) }
    }

    /// Store seeded from the payload the server embedded in the page.
    #[must_use]
    pub fn hydrate(api: Arc<dyn UserApi>, data: InitialData) -> Self {
        Self { auth: AuthStore::hydrate(api, data.auth) }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }
}
