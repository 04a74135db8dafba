//! Wire records returned by the PostgREST row API.

use campus_login_access::{Role, User};
use campus_login_core::{RoleId, UserId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A `users` row with the `roles(*)` embed.
#[derive(Debug, Deserialize)]
pub(crate) struct UserRecord {
    id: UserId,
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    role_id: Option<RoleId>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    roles: Option<RoleRecord>,
}

impl UserRecord {
    pub(crate) fn into_user(self) -> User {
        User::with_all_fields(
            self.id,
            self.email,
            self.first_name,
            self.last_name,
            self.role_id,
            self.roles.map(RoleRecord::into_role),
            self.created_date,
        )
    }
}

/// A `roles` row.
#[derive(Debug, Deserialize)]
pub(crate) struct RoleRecord {
    id: RoleId,
    #[serde(default)]
    role_name: Option<String>,
}

impl RoleRecord {
    pub(crate) fn into_role(self) -> Role {
        Role::new(self.id, self.role_name.unwrap_or_default())
    }
}

/// Parses a `timestamptz` (RFC 3339 with offset) or a `timestamp` (no
/// offset, taken as UTC) as rendered in JSON by Postgres.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|ts| ts.and_utc())
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}
