//! Authentication for the campus-login server.
//!
//! This module provides:
//! - OIDC authorization-code login with an external identity provider
//! - Signed-cookie sessions holding a snapshot of the signed-in user
//! - The session extractor for Axum routes
//!
//! # Authorization Model
//!
//! Only users already present in the directory may sign in. The role
//! linked to their directory row decides which dashboard they land on.
//! The role is copied into the session at sign-in and is not re-checked
//! per request, so directory changes take effect on the next login (or
//! session expiry).

pub mod middleware;
pub mod oidc;
pub mod routes;
pub mod session;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use campus_login_access::AuthFailure;
use campus_login_directory::UserDirectory;
use std::sync::Arc;
use url::Url;

use crate::config::SessionConfig;

pub use middleware::RequireSession;
pub use oidc::{IdentityProvider, OidcClient};
pub use routes::{callback, current_user, login, logout};

/// Shared application state.
///
/// Cheap to clone: clients sit behind `Arc`s and the key is a copy of the
/// derived bytes.
#[derive(Clone)]
pub struct AppState {
    /// User directory.
    pub directory: Arc<dyn UserDirectory>,
    /// Identity provider for the login flow.
    pub identity_provider: Arc<dyn IdentityProvider>,
    /// Session configuration.
    pub session_config: SessionConfig,
    /// Root of the front-end; target of every redirect.
    pub frontend_url: Url,
    cookie_key: Key,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        identity_provider: Arc<dyn IdentityProvider>,
        session_config: SessionConfig,
        frontend_url: Url,
        cookie_key: Key,
    ) -> Self {
        Self {
            directory,
            identity_provider,
            session_config,
            frontend_url,
            cookie_key,
        }
    }

    /// The front-end root without a trailing slash.
    pub fn frontend_root(&self) -> &str {
        self.frontend_url.as_str().trim_end_matches('/')
    }

    /// Where a successful sign-in lands.
    pub fn dashboard_url(&self, path: &str) -> String {
        format!("{}{}", self.frontend_root(), path)
    }

    /// Where a failed sign-in lands: the front-end root with `?error=`.
    pub fn failure_url(&self, failure: AuthFailure) -> String {
        let mut url = self.frontend_url.clone();
        url.query_pairs_mut()
            .append_pair("error", failure.message());
        url.to_string()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
