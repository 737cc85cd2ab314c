//! Server- and client-renderable views.
//!
//! Views are plain functions from a store snapshot to markup; the store is
//! passed in explicitly rather than injected.

pub mod menu;
pub mod page;
pub mod routes;
