//! OIDC (OpenID Connect) provider configuration.
//!
//! Fields with defaults can be omitted when loading from environment variables.
//! The defaults point at Google, which publishes its discovery document at
//! `https://accounts.google.com/.well-known/openid-configuration`.

use serde::{Deserialize, Serialize};

/// Configuration for the OIDC identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL, used for discovery.
    #[serde(default = "default_issuer_url")]
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The callback URL registered with the provider.
    #[serde(default = "default_redirect_uri")]
    redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Timeout for each call to the provider, in seconds.
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

fn default_issuer_url() -> String {
    "https://accounts.google.com".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8100/auth/callback".to_string()
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_timeout_seconds() -> u64 {
    5
}

impl OidcConfig {
    /// Creates a configuration for the default issuer.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            issuer_url: default_issuer_url(),
            client_id,
            client_secret,
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(client_id: String, client_secret: String) -> OidcConfigBuilder {
        OidcConfigBuilder::new(client_id, client_secret)
    }

    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

/// Builder for `OidcConfig`.
#[derive(Debug)]
pub struct OidcConfigBuilder {
    config: OidcConfig,
}

impl OidcConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            config: OidcConfig::new(client_id, client_secret),
        }
    }

    #[must_use]
    pub fn issuer_url(mut self, issuer_url: String) -> Self {
        self.config.issuer_url = issuer_url;
        self
    }

    #[must_use]
    pub fn redirect_uri(mut self, redirect_uri: String) -> Self {
        self.config.redirect_uri = redirect_uri;
        self
    }

    #[must_use]
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.config.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub fn build(self) -> OidcConfig {
        self.config
    }
}
