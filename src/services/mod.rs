//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation and persistence so route handlers can stay
//! focused on cookie plumbing and envelope formatting.

pub mod session;
pub mod user;
