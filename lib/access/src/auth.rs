//! Sign-in decision: from provider claims and a directory record to a session.
//!
//! Given the identity the provider vouched for and the user row found by
//! email, decide whether the user gets a session and where they land.

use crate::error::AuthFailure;
use crate::role::RoleName;
use crate::session::SessionUser;
use crate::user::User;

/// Claims about the signed-in user, from the ID token and userinfo endpoint.
#[derive(Debug, Clone, Default)]
pub struct OidcClaims {
    /// The subject claim (unique user identifier from the provider).
    pub subject: String,
    /// The issuer URL.
    pub issuer: String,
    /// Email address; the directory lookup key.
    pub email: Option<String>,
}

impl OidcClaims {
    /// Creates a new set of OIDC claims.
    #[must_use]
    pub fn new(subject: String, issuer: String) -> Self {
        Self {
            subject,
            issuer,
            email: None,
        }
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Returns the email if the provider supplied a non-empty one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

/// A successful sign-in: the session snapshot and the role it routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub user: SessionUser,
    pub role: RoleName,
}

impl SignIn {
    /// Builds the session snapshot for a directory user.
    ///
    /// The email recorded is the one the provider vouched for. Fails with
    /// `RoleNotFound` when the user has no linked role name and with
    /// `UnknownRole` when the name is outside the recognized set.
    pub fn for_user(user: &User, email: &str) -> Result<Self, AuthFailure> {
        let role_name = user.role_name().ok_or(AuthFailure::RoleNotFound)?;
        let role: RoleName = role_name.parse()?;

        Ok(Self {
            user: SessionUser::new(
                user.id().clone(),
                email.to_string(),
                user.full_name(),
                role,
            ),
            role,
        })
    }

    /// Returns the front-end path the user is sent to.
    #[must_use]
    pub fn destination(&self) -> &'static str {
        self.role.dashboard_path()
    }
}
