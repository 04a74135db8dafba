//! Router assembly and process-wide state.

use axum::{Json, Router, http::HeaderValue, routing::get};
use campus_login_directory::{PgDirectory, RestDirectory, UserDirectory};
use rootcause::Report;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{self, AppState, OidcClient};
use crate::config::{DirectoryBackend, DirectoryConfig, ServerConfig};
use crate::error::ServerError;

/// Builds the router with every endpoint, CORS, and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/user", get(auth::current_user))
        .route("/logout", get(auth::logout))
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Only the front-end origin may call with credentials.
fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed = state.frontend_url.origin().ascii_serialization();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts| origin.as_bytes() == allowed.as_bytes(),
        ))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn root() -> Json<Value> {
    Json(json!({"message": "Welcome to the API"}))
}

/// Builds the directory client for the configured backend.
pub fn build_directory(
    config: &DirectoryConfig,
) -> Result<Arc<dyn UserDirectory>, Report<ServerError>> {
    let directory: Arc<dyn UserDirectory> = match config.backend {
        DirectoryBackend::Rest => {
            let key = config.key.as_deref().ok_or_else(|| ServerError::Config {
                details: "directory.key is required for the rest backend".to_string(),
            })?;
            let directory = RestDirectory::new(&config.url, key, config.timeout()).map_err(|e| {
                ServerError::Directory {
                    details: e.to_string(),
                }
            })?;
            Arc::new(directory)
        }
        DirectoryBackend::Postgres => {
            let directory =
                PgDirectory::connect_lazy(&config.url, config.max_connections, config.timeout())
                    .map_err(|e| ServerError::Directory {
                        details: e.to_string(),
                    })?;
            Arc::new(directory)
        }
    };

    info!(backend = ?config.backend, "directory client ready");
    Ok(directory)
}

/// Builds the application state: directory client, provider discovery,
/// and the cookie key.
pub async fn build_state(config: ServerConfig) -> Result<AppState, Report<ServerError>> {
    let frontend_url = config.frontend_url().map_err(ServerError::from)?;
    let cookie_key = config.session.cookie_key().map_err(ServerError::from)?;
    let directory = build_directory(&config.directory)?;

    info!(issuer = config.oidc.issuer_url(), "discovering OIDC provider");
    let oidc_client = OidcClient::discover(config.oidc)
        .await
        .map_err(|e| ServerError::Discovery {
            details: e.to_string(),
        })?;

    Ok(AppState::new(
        directory,
        Arc::new(oidc_client),
        config.session,
        frontend_url,
        cookie_key,
    ))
}

/// Binds the address and serves until Ctrl-C.
pub async fn serve(address: &str, app: Router) -> Result<(), Report<ServerError>> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| ServerError::Bind {
            address: address.to_string(),
            details: e.to_string(),
        })?;

    info!("listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve {
            details: e.to_string(),
        })?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oidc::{AuthState, IdentityProvider, OidcError};
    use crate::auth::session::{AUTH_STATE_COOKIE, SESSION_COOKIE};
    use crate::config::SessionConfig;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, Response, StatusCode, header},
    };
    use axum_extra::extract::cookie::Key;
    use campus_login_access::OidcClaims;
    use campus_login_directory::MemoryDirectory;
    use tower::ServiceExt;
    use url::Url;

    const CSRF: &str = "csrf-123";
    const VERIFIER: &str = "verifier-456";

    /// Treats the authorization code as the email the provider vouches for.
    /// `no-email` yields claims without an email; `bad-code` fails.
    struct FakeProvider;

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn authorization_url(&self) -> (String, AuthState) {
            (
                format!("https://idp.test/authorize?state={CSRF}"),
                AuthState {
                    csrf_token: CSRF.to_string(),
                    pkce_verifier: VERIFIER.to_string(),
                    nonce: "nonce-789".to_string(),
                },
            )
        }

        async fn exchange_code(
            &self,
            code: &str,
            state: &AuthState,
        ) -> Result<OidcClaims, Report<OidcError>> {
            if state.pkce_verifier != VERIFIER || code == "bad-code" {
                return Err(OidcError::TokenExchange(
                    "invalid_grant: internal-token-detail".to_string(),
                )
                .into());
            }

            let claims = OidcClaims::new(format!("sub-{code}"), "https://idp.test".to_string());
            if code == "no-email" {
                return Ok(claims);
            }
            Ok(claims.with_email(Some(code.to_string())))
        }
    }

    struct Fixture {
        app: Router,
        directory: MemoryDirectory,
    }

    fn fixture_with_ttl(max_age_seconds: i64) -> Fixture {
        let directory = MemoryDirectory::new();
        let session_config = SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            max_age_seconds,
            secure_cookies: false,
        };
        let key = Key::derive_from(session_config.secret.as_bytes());
        let state = AppState::new(
            Arc::new(directory.clone()),
            Arc::new(FakeProvider),
            session_config,
            Url::parse("http://localhost:5173").expect("url"),
            key,
        );

        Fixture {
            app: router(state),
            directory,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_ttl(3600)
    }

    async fn send(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    /// The `Set-Cookie` header that sets `name` to a non-empty value.
    fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&prefix) && !value[prefix.len()..].starts_with(';'))
            .map(str::to_string)
    }

    /// The `Set-Cookie` header that removes `name`.
    fn removal_cookie(response: &Response<Body>, name: &str) -> Option<String> {
        let prefix = format!("{name}=;");
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&prefix))
            .map(str::to_string)
    }

    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap_or_default().to_string()
    }

    fn location(response: &Response<Body>) -> Url {
        let raw = response
            .headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .expect("ascii location");
        Url::parse(raw).expect("absolute location")
    }

    fn error_param(response: &Response<Body>) -> Option<String> {
        location(response)
            .query_pairs()
            .find(|(key, _)| key == "error")
            .map(|(_, value)| value.into_owned())
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn auth_state_cookie(app: &Router) -> String {
        let login = send(app, "/login", None).await;
        cookie_pair(&set_cookie(&login, AUTH_STATE_COOKIE).expect("auth_state cookie"))
    }

    async fn sign_in(app: &Router, code: &str) -> Response<Body> {
        let cookie = auth_state_cookie(app).await;
        send(
            app,
            &format!("/auth/callback?code={code}&state={CSRF}"),
            Some(&cookie),
        )
        .await
    }

    fn assert_refused(response: &Response<Body>, reason: &str) {
        assert_eq!(response.status(), StatusCode::FOUND);
        let url = location(response);
        assert_eq!(url.origin().ascii_serialization(), "http://localhost:5173");
        assert_eq!(url.path(), "/");
        assert_eq!(error_param(response).as_deref(), Some(reason));
        assert!(set_cookie(response, SESSION_COOKIE).is_none());
    }

    #[tokio::test]
    async fn root_welcomes() {
        let fx = fixture();
        let response = send(&fx.app, "/", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Welcome to the API"})
        );
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_state_cookie() {
        let fx = fixture();
        let response = send(&fx.app, "/login", None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response).host_str(), Some("idp.test"));

        let cookie = set_cookie(&response, AUTH_STATE_COOKIE).expect("auth_state cookie");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=600"));
        assert!(!cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn unknown_email_is_not_authorized() {
        let fx = fixture();
        fx.directory.insert_role("Student").await;

        let response = sign_in(&fx.app, "stranger@campus.edu").await;
        assert_refused(&response, "User not authorized");
    }

    #[tokio::test]
    async fn each_role_lands_on_its_dashboard() {
        let fx = fixture();
        let cases = [
            ("Student", "ada@campus.edu", "/student-dashboard"),
            ("Faculty", "grace@campus.edu", "/faculty-dashboard"),
            ("Admin", "alan@campus.edu", "/admin-dashboard"),
        ];

        for (role_name, email, path) in cases {
            let role = fx.directory.insert_role(role_name).await;
            fx.directory
                .insert_user(email, Some("Test"), Some("User"), Some(role.id()))
                .await;

            let response = sign_in(&fx.app, email).await;
            assert_eq!(response.status(), StatusCode::FOUND, "{role_name}");
            assert_eq!(
                location(&response).as_str(),
                format!("http://localhost:5173{path}")
            );

            let cookie = cookie_pair(&set_cookie(&response, SESSION_COOKIE).expect("session"));
            let user = body_json(send(&fx.app, "/user", Some(&cookie)).await).await;
            assert_eq!(user["role"], role_name);
            assert_eq!(user["email"], email);
        }
    }

    #[tokio::test]
    async fn unrecognized_roles_write_no_session() {
        let fx = fixture();
        for (role_name, email) in [("Guest", "guest@campus.edu"), ("student", "lower@campus.edu")] {
            let role = fx.directory.insert_role(role_name).await;
            fx.directory
                .insert_user(email, None, None, Some(role.id()))
                .await;

            let response = sign_in(&fx.app, email).await;
            assert_refused(&response, "Unknown role");
        }
    }

    #[tokio::test]
    async fn user_without_role_is_refused() {
        let fx = fixture();
        fx.directory
            .insert_user("norole@campus.edu", Some("No"), Some("Role"), None)
            .await;
        let empty = fx.directory.insert_role("").await;
        fx.directory
            .insert_user("empty@campus.edu", None, None, Some(empty.id()))
            .await;

        assert_refused(&sign_in(&fx.app, "norole@campus.edu").await, "User role not found");
        assert_refused(&sign_in(&fx.app, "empty@campus.edu").await, "User role not found");
    }

    #[tokio::test]
    async fn directory_outage_is_not_a_refusal() {
        let fx = fixture();
        let role = fx.directory.insert_role("Student").await;
        fx.directory
            .insert_user("ada@campus.edu", None, None, Some(role.id()))
            .await;
        fx.directory.set_unavailable(true);

        let response = sign_in(&fx.app, "ada@campus.edu").await;
        assert_refused(&response, "Directory unavailable");
    }

    #[tokio::test]
    async fn failed_exchange_hides_provider_detail() {
        let fx = fixture();
        let response = sign_in(&fx.app, "bad-code").await;

        assert_refused(&response, "Authentication Failed");
        assert!(!location(&response).as_str().contains("internal-token-detail"));
    }

    #[tokio::test]
    async fn missing_email_fails_authentication() {
        let fx = fixture();
        let response = sign_in(&fx.app, "no-email").await;
        assert_refused(&response, "Authentication Failed");
    }

    #[tokio::test]
    async fn csrf_mismatch_fails_authentication() {
        let fx = fixture();
        let cookie = auth_state_cookie(&fx.app).await;
        let response = send(
            &fx.app,
            "/auth/callback?code=ada@campus.edu&state=forged",
            Some(&cookie),
        )
        .await;

        assert_refused(&response, "Authentication Failed");
    }

    #[tokio::test]
    async fn provider_error_fails_authentication() {
        let fx = fixture();
        let cookie = auth_state_cookie(&fx.app).await;
        let response = send(
            &fx.app,
            &format!("/auth/callback?error=access_denied&state={CSRF}"),
            Some(&cookie),
        )
        .await;

        assert_refused(&response, "Authentication Failed");
        assert!(removal_cookie(&response, AUTH_STATE_COOKIE).is_some());
    }

    #[tokio::test]
    async fn callback_without_login_fails_authentication() {
        let fx = fixture();
        let response = send(
            &fx.app,
            &format!("/auth/callback?code=ada@campus.edu&state={CSRF}"),
            None,
        )
        .await;
        assert_refused(&response, "Authentication Failed");

        let response = send(&fx.app, "/auth/callback", None).await;
        assert_refused(&response, "Authentication Failed");
    }

    #[tokio::test]
    async fn session_cookie_attributes_and_state_cleared() {
        let fx = fixture();
        let role = fx.directory.insert_role("Faculty").await;
        fx.directory
            .insert_user("grace@campus.edu", Some("Grace"), Some("Hopper"), Some(role.id()))
            .await;

        let response = sign_in(&fx.app, "grace@campus.edu").await;
        let cookie = set_cookie(&response, SESSION_COOKIE).expect("session cookie");

        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));
        assert!(removal_cookie(&response, AUTH_STATE_COOKIE).is_some());
    }

    #[tokio::test]
    async fn user_requires_session() {
        let fx = fixture();
        let response = send(&fx.app, "/user", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"detail": "Not authenticated"}));
    }

    #[tokio::test]
    async fn user_returns_snapshot_unaffected_by_directory_changes() {
        let fx = fixture();
        let role = fx.directory.insert_role("Student").await;
        let id = fx
            .directory
            .insert_user("ada@campus.edu", Some("Ada"), Some("Lovelace"), Some(role.id()))
            .await;

        let response = sign_in(&fx.app, "ada@campus.edu").await;
        let cookie = cookie_pair(&set_cookie(&response, SESSION_COOKIE).expect("session"));

        fx.directory.rename_role(role.id(), "Admin").await;
        fx.directory.remove_user("ada@campus.edu").await;

        let response = send(&fx.app, "/user", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "id": id,
                "email": "ada@campus.edu",
                "name": "Ada Lovelace",
                "role": "Student"
            })
        );
    }

    #[tokio::test]
    async fn user_returns_integer_key_as_a_number() {
        let fx = fixture();
        let role = fx.directory.insert_role("Faculty").await;
        let id = fx
            .directory
            .insert_user("grace@campus.edu", Some("Grace"), Some("Hopper"), Some(role.id()))
            .await;
        let key = id.as_integer().expect("memory directory uses integer keys");

        let response = sign_in(&fx.app, "grace@campus.edu").await;
        let cookie = cookie_pair(&set_cookie(&response, SESSION_COOKIE).expect("session"));

        let body = body_json(send(&fx.app, "/user", Some(&cookie)).await).await;
        assert!(body["id"].is_number(), "{body}");
        assert_eq!(body["id"], json!(key));
    }

    #[tokio::test]
    async fn expired_session_is_not_authenticated() {
        let fx = fixture_with_ttl(0);
        let role = fx.directory.insert_role("Student").await;
        fx.directory
            .insert_user("ada@campus.edu", None, None, Some(role.id()))
            .await;

        let response = sign_in(&fx.app, "ada@campus.edu").await;
        let cookie = cookie_pair(&set_cookie(&response, SESSION_COOKIE).expect("session"));

        let response = send(&fx.app, "/user", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tampered_session_is_not_authenticated() {
        let fx = fixture();
        let role = fx.directory.insert_role("Student").await;
        fx.directory
            .insert_user("ada@campus.edu", None, None, Some(role.id()))
            .await;

        let response = sign_in(&fx.app, "ada@campus.edu").await;
        let cookie = cookie_pair(&set_cookie(&response, SESSION_COOKIE).expect("session"));
        let forged = cookie.replace("Student", "Admin");
        assert_ne!(forged, cookie);

        let response = send(&fx.app, "/user", Some(&forged)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_clears_session_and_is_idempotent() {
        let fx = fixture();
        let role = fx.directory.insert_role("Admin").await;
        fx.directory
            .insert_user("alan@campus.edu", None, None, Some(role.id()))
            .await;

        let response = sign_in(&fx.app, "alan@campus.edu").await;
        let cookie = cookie_pair(&set_cookie(&response, SESSION_COOKIE).expect("session"));

        let response = send(&fx.app, "/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let removal = removal_cookie(&response, SESSION_COOKIE).expect("removal cookie");
        assert!(removal.contains("Max-Age=0"));
        assert_eq!(
            body_json(response).await,
            json!({"redirect": "http://localhost:5173"})
        );

        // The browser drops the cookie, so the next request carries none.
        let response = send(&fx.app, "/user", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&fx.app, "/logout", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_allows_only_frontend_origin() {
        let fx = fixture();

        let allowed = fx
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:5173"))
        );
        assert_eq!(
            allowed
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );

        let denied = fx
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://evil.test")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert!(
            denied
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn directory_config_selects_backend() {
        let config = DirectoryConfig {
            backend: DirectoryBackend::Postgres,
            url: "postgres://campus@localhost/campus".to_string(),
            key: None,
            timeout_seconds: 1,
            max_connections: 1,
        };
        // Lazy pools do not connect until first use.
        assert!(build_directory(&config).is_ok());

        let config = DirectoryConfig {
            backend: DirectoryBackend::Rest,
            ..config
        };
        assert!(build_directory(&config).is_err());
    }
}
