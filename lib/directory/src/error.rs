//! Directory error types.

use std::fmt;

/// Errors from directory operations.
#[derive(Debug)]
pub enum DirectoryError {
    /// The backend could not be configured (bad URL, bad key).
    Configuration {
        /// Error details.
        details: String,
    },
    /// The directory could not be reached.
    Unavailable {
        /// Error details.
        details: String,
    },
    /// The REST API answered with a non-success status.
    Request {
        /// HTTP status code.
        status: u16,
        /// Response body or error details.
        details: String,
    },
    /// A row could not be decoded.
    Decode {
        /// Error details.
        details: String,
    },
    /// A Postgres query failed.
    Database {
        /// Error details.
        details: String,
    },
    /// An insert referenced a role that does not exist.
    UnknownRole {
        /// The referenced role id.
        role_id: String,
    },
    /// An insert returned no row.
    EmptyInsert,
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => {
                write!(f, "invalid directory configuration: {}", details)
            }
            Self::Unavailable { details } => {
                write!(f, "directory unavailable: {}", details)
            }
            Self::Request { status, details } => {
                write!(f, "directory request failed with status {}: {}", status, details)
            }
            Self::Decode { details } => {
                write!(f, "failed to decode directory row: {}", details)
            }
            Self::Database { details } => {
                write!(f, "directory database error: {}", details)
            }
            Self::UnknownRole { role_id } => {
                write!(f, "role '{}' does not exist", role_id)
            }
            Self::EmptyInsert => write!(f, "insert returned no row"),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Self::Unavailable {
                    details: err.to_string(),
                }
            }
            sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => Self::Decode {
                details: err.to_string(),
            },
            _ => Self::Database {
                details: err.to_string(),
            },
        }
    }
}
