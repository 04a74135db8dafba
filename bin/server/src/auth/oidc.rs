//! OIDC client implementation using the openidconnect crate.

use async_trait::async_trait;
use campus_login_access::{OidcClaims, OidcConfig};
use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreProviderMetadata, CoreUserInfoClaims,
};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, OAuth2TokenResponse, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, TokenResponse,
};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// The identity provider as seen by the callback flow.
///
/// [`OidcClient`] is the production implementation; tests substitute a
/// fake so the router can be driven without a provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the provider authorization URL and the state to keep until
    /// the callback.
    fn authorization_url(&self) -> (String, AuthState);

    /// Exchanges the authorization code and returns the verified claims.
    async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<OidcClaims, Report<OidcError>>;
}

/// A client built from discovery metadata: token and userinfo endpoints
/// are only known at runtime.
type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// Data needed to complete the OIDC callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

/// OIDC client for authenticating users.
pub struct OidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    http_client: reqwest::Client,
    config: OidcConfig,
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    pub async fn discover(config: OidcConfig) -> Result<Self, Report<OidcError>> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                OidcError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        info!(
            issuer = config.issuer_url(),
            userinfo = provider_metadata.userinfo_endpoint().is_some(),
            "discovered OIDC provider"
        );

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            provider_metadata,
            redirect_url,
            http_client,
            config,
        })
    }

    fn client(&self) -> DiscoveredClient {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn authorization_url(&self) -> (String, AuthState) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let client = self.client();
        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // The client always requests `openid` itself.
        for scope in self.config.scopes().into_iter().filter(|s| *s != "openid") {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<OidcClaims, Report<OidcError>> {
        let client = self.client();

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| OidcError::TokenExchange(format!("token endpoint error: {}", e)))?
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| OidcError::TokenExchange(format!("token exchange failed: {}", e)))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| OidcError::TokenExchange("no ID token in response".to_string()))?;

        let nonce = Nonce::new(state.nonce.clone());
        let id_claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| {
                OidcError::TokenValidation(format!("ID token validation failed: {}", e))
            })?;

        let subject = id_claims.subject().clone();
        let mut claims = OidcClaims::new(subject.to_string(), id_claims.issuer().to_string())
            .with_email(id_claims.email().map(|e| e.as_str().to_string()));

        // Providers without a userinfo endpoint only have the ID token claims.
        let request = match client.user_info(token_response.access_token().clone(), Some(subject))
        {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "no userinfo endpoint; using ID token claims");
                return Ok(claims);
            }
        };

        let userinfo: CoreUserInfoClaims = request
            .request_async(&self.http_client)
            .await
            .map_err(|e| OidcError::UserInfo(format!("userinfo request failed: {}", e)))?;

        if let Some(email) = userinfo.email() {
            claims.email = Some(email.as_str().to_string());
        } else {
            warn!("userinfo response has no email claim");
        }

        Ok(claims)
    }
}

/// OIDC-related errors.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// Token validation failed.
    TokenValidation(String),
    /// Userinfo request failed.
    UserInfo(String),
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
            Self::TokenExchange(msg) => write!(f, "OIDC token exchange error: {}", msg),
            Self::TokenValidation(msg) => write!(f, "OIDC token validation error: {}", msg),
            Self::UserInfo(msg) => write!(f, "OIDC userinfo error: {}", msg),
        }
    }
}

impl std::error::Error for OidcError {}
