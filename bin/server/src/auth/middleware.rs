//! Session extractors for Axum.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use campus_login_access::SessionUser;
use serde_json::json;

use super::session::read_session;

/// Extractor for requiring a signed-in user.
///
/// Rejects with 401 when the session cookie is absent, fails signature
/// verification, or has expired.
pub struct RequireSession(pub SessionUser);

impl<S> FromRequestParts<S> for RequireSession
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(jar) = SignedCookieJar::<Key>::from_request_parts(parts, state).await;

        let session = read_session(&jar).ok_or(SessionRejection::NotAuthenticated)?;
        Ok(RequireSession(session.into_user()))
    }
}

/// Rejection type for the session extractor.
#[derive(Debug)]
pub enum SessionRejection {
    NotAuthenticated,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Not authenticated"})),
            )
                .into_response(),
        }
    }
}
