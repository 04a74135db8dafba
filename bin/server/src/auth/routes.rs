//! Authentication routes for login, callback, current user, and logout.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use campus_login_access::{AuthFailure, OidcClaims, Session, SessionUser, SignIn};
use rootcause::Report;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::{error, info, instrument, warn};

use super::{
    AppState,
    middleware::RequireSession,
    oidc::OidcError,
    session::{clear_auth_state, clear_session, read_auth_state, write_auth_state, write_session},
};
use campus_login_directory::DirectoryError;

/// Query parameters for the OIDC callback.
///
/// Every field is optional: the provider sends `error` instead of `code`
/// when the user declines, and a hand-typed URL may carry nothing.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// A 302 redirect. `axum::response::Redirect::to` answers 303.
fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            error!(error = %e, location, "redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// A 302 that also applies the jar's cookie changes.
fn found_with(jar: SignedCookieJar, location: &str) -> Response {
    (jar, found(location)).into_response()
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let (auth_url, auth_state) = state.identity_provider.authorization_url();

    match write_auth_state(jar, &auth_state, &state.session_config) {
        Ok(jar) => found_with(jar, &auth_url),
        Err(e) => {
            error!(error = %e, "failed to serialize auth state");
            found(&state.failure_url(AuthFailure::AuthenticationFailed))
        }
    }
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
///
/// Every outcome is a redirect: to the role dashboard with a new session,
/// or to the front-end root with `?error=` naming the reason.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: SignedCookieJar,
) -> Response {
    let outcome = complete_sign_in(&state, &query, &jar).await;
    let jar = clear_auth_state(jar);

    let sign_in = match outcome {
        Ok(sign_in) => sign_in,
        Err(e) => {
            e.log();
            return found_with(jar, &state.failure_url(e.failure()));
        }
    };

    let session = Session::new(sign_in.user.clone(), state.session_config.ttl());
    let jar = match write_session(jar.clone(), &session, &state.session_config) {
        Ok(jar) => jar,
        Err(e) => {
            error!(error = %e, "failed to serialize session");
            return found_with(jar, &state.failure_url(AuthFailure::AuthenticationFailed));
        }
    };

    info!(
        user_id = %sign_in.user.id(),
        email = sign_in.user.email(),
        role = %sign_in.role,
        "user signed in"
    );

    found_with(jar, &state.dashboard_url(sign_in.destination()))
}

/// Runs the callback steps up to the sign-in decision.
async fn complete_sign_in(
    state: &AppState,
    query: &CallbackQuery,
    jar: &SignedCookieJar,
) -> Result<SignIn, CallbackError> {
    if let Some(error) = &query.error {
        return Err(CallbackError::ProviderRejected {
            error: error.clone(),
            description: query.error_description.clone(),
        });
    }

    let auth_state = read_auth_state(jar).ok_or(CallbackError::MissingAuthState)?;

    if query.state.as_deref() != Some(auth_state.csrf_token.as_str()) {
        return Err(CallbackError::CsrfMismatch);
    }

    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let claims = state
        .identity_provider
        .exchange_code(code, &auth_state)
        .await
        .map_err(CallbackError::Provider)?;

    let email = verified_email(&claims)?;

    let user = state
        .directory
        .find_user_by_email(&email)
        .await
        .map_err(CallbackError::Directory)?
        .ok_or_else(|| CallbackError::NotInDirectory {
            email: email.clone(),
        })?;

    SignIn::for_user(&user, &email).map_err(|failure| CallbackError::Refused {
        failure,
        email,
        role: user.role_name().map(str::to_string),
    })
}

fn verified_email(claims: &OidcClaims) -> Result<String, CallbackError> {
    claims
        .email()
        .map(str::to_string)
        .ok_or_else(|| CallbackError::MissingEmail {
            subject: claims.subject.clone(),
        })
}

/// Why a callback did not produce a session.
///
/// Carries the diagnostic detail for the log; only the [`AuthFailure`]
/// reason reaches the browser.
#[derive(Debug)]
enum CallbackError {
    ProviderRejected {
        error: String,
        description: Option<String>,
    },
    MissingAuthState,
    CsrfMismatch,
    MissingCode,
    Provider(Report<OidcError>),
    MissingEmail {
        subject: String,
    },
    Directory(Report<DirectoryError>),
    NotInDirectory {
        email: String,
    },
    Refused {
        failure: AuthFailure,
        email: String,
        role: Option<String>,
    },
}

impl CallbackError {
    fn failure(&self) -> AuthFailure {
        match self {
            Self::ProviderRejected { .. }
            | Self::MissingAuthState
            | Self::CsrfMismatch
            | Self::MissingCode
            | Self::Provider(_)
            | Self::MissingEmail { .. } => AuthFailure::AuthenticationFailed,
            Self::Directory(_) => AuthFailure::DirectoryUnavailable,
            Self::NotInDirectory { .. } => AuthFailure::UserNotAuthorized,
            Self::Refused { failure, .. } => *failure,
        }
    }

    fn log(&self) {
        match self {
            Self::Provider(report) => error!(error = %report, "token exchange failed"),
            Self::Directory(report) => error!(error = %report, "directory lookup failed"),
            Self::NotInDirectory { email } => {
                warn!(email = %email, "sign-in refused: email not in directory")
            }
            Self::Refused {
                failure,
                email,
                role,
            } => warn!(
                email = %email,
                role = role.as_deref().unwrap_or(""),
                reason = failure.message(),
                "sign-in refused"
            ),
            other => warn!(reason = %other, "callback rejected"),
        }
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderRejected { error, description } => match description {
                Some(description) => write!(f, "provider returned '{}': {}", error, description),
                None => write!(f, "provider returned '{}'", error),
            },
            Self::MissingAuthState => write!(f, "missing or invalid auth state cookie"),
            Self::CsrfMismatch => write!(f, "CSRF token mismatch"),
            Self::MissingCode => write!(f, "no authorization code in callback"),
            Self::Provider(report) => write!(f, "{}", report),
            Self::MissingEmail { subject } => {
                write!(f, "provider returned no email for subject '{}'", subject)
            }
            Self::Directory(report) => write!(f, "{}", report),
            Self::NotInDirectory { email } => write!(f, "'{}' is not in the directory", email),
            Self::Refused { failure, email, .. } => {
                write!(f, "'{}' refused: {}", email, failure)
            }
        }
    }
}

/// Returns the signed-in user's session snapshot.
pub async fn current_user(RequireSession(user): RequireSession) -> Json<SessionUser> {
    Json(user)
}

/// Logs out the user by removing the session cookie.
///
/// Sessions live only in the cookie, so there is nothing to delete
/// server-side. Succeeds whether or not a session was present.
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    (
        clear_session(jar),
        Json(json!({"redirect": state.frontend_root()})),
    )
}
