//! Error types for the access crate.
//!
//! - `AuthFailure`: why a sign-in was refused, in the form shown to the browser
//! - `UnknownRoleName`: a directory role outside the recognized set

use std::fmt;

/// Reasons a sign-in callback is refused.
///
/// This is a closed set: the browser only ever sees one of these
/// messages. Diagnostic detail stays in the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// The provider exchange failed, the state did not match, or the
    /// provider did not supply an email address.
    AuthenticationFailed,
    /// The email is not present in the user directory.
    UserNotAuthorized,
    /// The user row has no linked role.
    RoleNotFound,
    /// The linked role is not one of the recognized role names.
    UnknownRole,
    /// The user directory could not be reached or answered with an error.
    DirectoryUnavailable,
}

impl AuthFailure {
    /// Returns the message carried in the `error` query parameter.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "Authentication Failed",
            Self::UserNotAuthorized => "User not authorized",
            Self::RoleNotFound => "User role not found",
            Self::UnknownRole => "Unknown role",
            Self::DirectoryUnavailable => "Directory unavailable",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthFailure {}

/// A role name that is not one of `Student`, `Faculty`, `Admin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoleName {
    /// The name as stored in the directory.
    pub name: String,
}

impl fmt::Display for UnknownRoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized role name: '{}'", self.name)
    }
}

impl std::error::Error for UnknownRoleName {}

impl From<UnknownRoleName> for AuthFailure {
    fn from(_: UnknownRoleName) -> Self {
        Self::UnknownRole
    }
}
