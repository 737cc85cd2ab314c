//! Networking modules.
//!
//! `api` defines the `UserApi` seam the auth store calls through and its
//! HTTP implementation.

pub mod api;
