//! Session snapshots for signed-in users.
//!
//! A session is a copy of the user's identity and role taken at sign-in.
//! It is not refreshed from the directory afterwards: changes to a user's
//! name or role take effect on their next sign-in.

use campus_login_core::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::role::RoleName;

/// The identity snapshot returned by `/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    id: UserId,
    email: String,
    name: String,
    role: RoleName,
}

impl SessionUser {
    #[must_use]
    pub fn new(id: UserId, email: String, name: String, role: RoleName) -> Self {
        Self {
            id,
            email,
            name,
            role,
        }
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// First and last name joined by a space, trimmed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn role(&self) -> RoleName {
        self.role
    }
}

/// A snapshot with a fixed lifetime from creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user: SessionUser,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session that expires `ttl` from now.
    #[must_use]
    pub fn new(user: SessionUser, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[must_use]
    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    #[must_use]
    pub fn into_user(self) -> SessionUser {
        self.user
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
