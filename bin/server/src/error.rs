//! Startup errors for the server binary.
//!
//! Request-time failures never surface here: the callback turns them into
//! redirects and the extractors into 401s. These variants abort startup.

use std::fmt;

/// Errors that stop the server from starting or serving.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The directory client could not be built.
    Directory { details: String },
    /// The identity provider could not be discovered.
    Discovery { details: String },
    /// The listener could not bind its address.
    Bind { address: String, details: String },
    /// The server stopped with an I/O error.
    Serve { details: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {}", details),
            Self::Directory { details } => {
                write!(f, "failed to set up directory: {}", details)
            }
            Self::Discovery { details } => {
                write!(f, "failed to discover identity provider: {}", details)
            }
            Self::Bind { address, details } => {
                write!(f, "failed to bind to '{}': {}", address, details)
            }
            Self::Serve { details } => write!(f, "server error: {}", details),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts() {
        let err = ServerError::from(config::ConfigError::Message("missing oidc".to_string()));
        assert_eq!(err.to_string(), "invalid configuration: missing oidc");
    }

    #[test]
    fn bind_error_names_address() {
        let err = ServerError::Bind {
            address: "0.0.0.0:8100".to_string(),
            details: "address in use".to_string(),
        };
        assert!(err.to_string().contains("0.0.0.0:8100"));
    }
}
