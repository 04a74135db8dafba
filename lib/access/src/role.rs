//! Roles as stored in the directory, and the closed set the platform routes on.
//!
//! The directory may hold any role name. Only `Student`, `Faculty`, and
//! `Admin` lead to a dashboard; matching is exact and case-sensitive.

use campus_login_core::RoleId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownRoleName;

/// A row of the `roles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    role_name: String,
}

impl Role {
    /// Creates a role record.
    #[must_use]
    pub fn new(id: RoleId, role_name: String) -> Self {
        Self { id, role_name }
    }

    /// Returns the role's directory id.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Returns the role name exactly as stored.
    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role_name
    }
}

/// A role the platform knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleName {
    Student,
    Faculty,
    Admin,
}

impl RoleName {
    /// All recognized roles.
    pub const ALL: [RoleName; 3] = [Self::Student, Self::Faculty, Self::Admin];

    /// Returns the name as stored in the directory.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Faculty => "Faculty",
            Self::Admin => "Admin",
        }
    }

    /// Returns the front-end path of this role's dashboard.
    #[must_use]
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Self::Student => "/student-dashboard",
            Self::Faculty => "/faculty-dashboard",
            Self::Admin => "/admin-dashboard",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = UnknownRoleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRoleName {
                name: s.to_string(),
            })
    }
}
