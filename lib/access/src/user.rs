//! User records owned by the external directory.
//!
//! This service reads users to decide who may sign in. It can also
//! insert a user (`NewUser`), though the sign-in flow never does: only
//! rows created out-of-band can authenticate.

use campus_login_core::{RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A row of the `users` table with its joined role, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    /// Unique; the sign-in lookup key.
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role_id: Option<RoleId>,
    /// The `roles` row referenced by `role_id`, when the join found one.
    role: Option<Role>,
    created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        email: String,
        first_name: Option<String>,
        last_name: Option<String>,
        role_id: Option<RoleId>,
        role: Option<Role>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            email,
            first_name,
            last_name,
            role_id,
            role,
            created_at,
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

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    #[must_use]
    pub fn role_id(&self) -> Option<&RoleId> {
        self.role_id.as_ref()
    }

    /// Returns the joined role record.
    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    /// Returns the joined role's name, treating an empty name as absent.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        self.role
            .as_ref()
            .map(Role::role_name)
            .filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns first and last name joined by a space, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

/// Splits a display name on its first space into first and last name.
///
/// The last name is empty when there is no space.
#[must_use]
pub fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

/// The column values for inserting a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: RoleId,
    #[serde(rename = "created_date")]
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Builds an insert from a display name, stamped with the current UTC time.
    #[must_use]
    pub fn new(email: &str, full_name: &str, role_id: &RoleId) -> Self {
        let (first_name, last_name) = split_full_name(full_name);
        Self {
            email: email.to_string(),
            first_name,
            last_name,
            role_id: role_id.clone(),
            created_at: Utc::now(),
        }
    }
}
