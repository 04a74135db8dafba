//! Signed-cookie session store.
//!
//! The session snapshot and the pending login state are serialized as JSON
//! into cookies signed with the server key. A cookie whose signature does
//! not verify is treated as absent. The session also carries its own
//! expiry, so a replayed cookie is refused once the TTL has passed even if
//! the browser kept it.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use campus_login_access::Session;
use time::Duration as TimeDuration;
use tracing::{debug, warn};

use super::oidc::AuthState;
use crate::config::SessionConfig;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during OIDC flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// How long a login may take between `/login` and the callback.
const AUTH_STATE_MAX_AGE: TimeDuration = TimeDuration::minutes(10);

fn build_cookie(
    name: &'static str,
    value: String,
    max_age: TimeDuration,
    config: &SessionConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Adds the session cookie.
pub fn write_session(
    jar: SignedCookieJar,
    session: &Session,
    config: &SessionConfig,
) -> Result<SignedCookieJar, serde_json::Error> {
    let value = serde_json::to_string(session)?;
    let cookie = build_cookie(
        SESSION_COOKIE,
        value,
        TimeDuration::seconds(config.max_age_seconds),
        config,
    );
    Ok(jar.add(cookie))
}

/// Reads a verified, unexpired session from the jar.
pub fn read_session(jar: &SignedCookieJar) -> Option<Session> {
    let cookie = jar.get(SESSION_COOKIE)?;

    let session: Session = serde_json::from_str(cookie.value())
        .inspect_err(|e| warn!(error = %e, "session cookie did not decode"))
        .ok()?;

    if session.is_expired() {
        debug!(expires_at = %session.expires_at(), "session expired");
        return None;
    }

    Some(session)
}

/// Removes the session cookie. Removing an absent cookie is harmless.
pub fn clear_session(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Adds the pending login state cookie.
pub fn write_auth_state(
    jar: SignedCookieJar,
    state: &AuthState,
    config: &SessionConfig,
) -> Result<SignedCookieJar, serde_json::Error> {
    let value = serde_json::to_string(state)?;
    Ok(jar.add(build_cookie(
        AUTH_STATE_COOKIE,
        value,
        AUTH_STATE_MAX_AGE,
        config,
    )))
}

/// Reads the pending login state, if present and verified.
pub fn read_auth_state(jar: &SignedCookieJar) -> Option<AuthState> {
    let cookie = jar.get(AUTH_STATE_COOKIE)?;
    serde_json::from_str(cookie.value())
        .inspect_err(|e| warn!(error = %e, "auth state cookie did not decode"))
        .ok()
}

/// Removes the login state cookie.
pub fn clear_auth_state(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(AUTH_STATE_COOKIE).path("/"))
}
