//! campus-login web server.
//!
//! This crate provides the HTTP surface of the campus sign-in flow:
//! OIDC login against an external identity provider, an allow-list check
//! against the user directory, and a signed-cookie session read by the
//! front-end through `/user`.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
