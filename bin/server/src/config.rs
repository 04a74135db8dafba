//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use `__` as separator, e.g. `SESSION__SECRET` or `OIDC__CLIENT_ID`.
//!
//! See [`OidcConfig`](campus_login_access::OidcConfig) for identity
//! provider configuration.

use axum_extra::extract::cookie::Key;
use campus_login_access::OidcConfig;
use config::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Minimum length of the session signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Root URL of the front-end; also the only allowed CORS origin.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// User directory configuration.
    pub directory: DirectoryConfig,

    /// Session configuration.
    pub session: SessionConfig,

    /// OIDC authentication configuration.
    pub oidc: OidcConfig,
}

/// Which directory backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    /// The hosted PostgREST row API.
    #[default]
    Rest,
    /// A direct Postgres connection.
    Postgres,
}

/// User directory configuration.
#[derive(Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub backend: DirectoryBackend,

    /// REST base URL, or Postgres connection URL.
    pub url: String,

    /// REST API key. Required for the `rest` backend.
    #[serde(default)]
    pub key: Option<String>,

    /// Timeout for each directory call, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Postgres pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("backend", &self.backend)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

/// Session-related configuration.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret the session cookie signing key is derived from.
    pub secret: String,

    /// Session lifetime from creation, in seconds.
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Off by default for local HTTP development; turn on behind TLS.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// Derives the cookie signing key from the secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn cookie_key(&self) -> Result<Key, ConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "session.secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(Key::derive_from(self.secret.as_bytes()))
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_age_seconds)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("max_age_seconds", &self.max_age_seconds)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8100".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_timeout_seconds() -> u64 {
    5
}

fn default_max_connections() -> u32 {
    5
}

fn default_max_age_seconds() -> i64 {
    3600
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Loads and validates configuration from a single source.
    pub fn load<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses the front-end root URL.
    pub fn frontend_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.frontend_url)
            .map_err(|e| ConfigError::Message(format!("invalid frontend_url: {}", e)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.frontend_url()?;
        self.session.cookie_key()?;

        if self.session.max_age_seconds <= 0 {
            return Err(ConfigError::Message(
                "session.max_age_seconds must be positive".to_string(),
            ));
        }

        if self.directory.backend == DirectoryBackend::Rest && self.directory.key.is_none() {
            return Err(ConfigError::Message(
                "directory.key is required for the rest backend".to_string(),
            ));
        }

        Ok(())
    }
}
