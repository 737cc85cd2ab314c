//! Observable client state.

pub mod auth;
pub mod main;
