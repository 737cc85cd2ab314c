//! Client tier of the starter kit.
//!
//! SYSTEM CONTEXT
//! ==============
//! `net` wraps the `/api/user` endpoints, `state` holds the observable auth
//! store and the top-level store that owns it, and `views` renders the page
//! shell from a store snapshot. The server renders the same views for the
//! first paint and embeds the hydration payload the client store starts from.

pub mod net;
pub mod state;
pub mod views;
