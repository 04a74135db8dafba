//! Directory backed by a direct Postgres connection.
//!
//! Keys are read through `to_jsonb(..)::text` so an integer key stays a
//! number and a UUID key stays a string. Inserts resolve `role_id` through
//! the `roles` table, which both checks the reference and casts it to the
//! key type.

use async_trait::async_trait;
use campus_login_access::{NewUser, Role, User};
use campus_login_core::{Result, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::UserDirectory;
use crate::error::DirectoryError;

/// Row type for user queries joined with their role.
#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role_id: Option<String>,
    created_date: Option<DateTime<Utc>>,
    joined_role_id: Option<String>,
    role_name: Option<String>,
}

impl UserRow {
    fn into_user(self) -> std::result::Result<User, DirectoryError> {
        let role = match self.joined_role_id {
            Some(id) => Some(Role::new(
                decode_key(&id)?,
                self.role_name.unwrap_or_default(),
            )),
            None => None,
        };
        let role_id = self.role_id.as_deref().map(decode_key).transpose()?;

        Ok(User::with_all_fields(
            decode_key::<UserId>(&self.id)?,
            self.email,
            self.first_name,
            self.last_name,
            role_id,
            role,
            self.created_date,
        ))
    }
}

/// Decodes a key rendered by `to_jsonb(..)::text`.
fn decode_key<T: DeserializeOwned>(raw: &str) -> std::result::Result<T, DirectoryError> {
    serde_json::from_str(raw).map_err(|e| DirectoryError::Decode {
        details: format!("invalid key {}: {}", raw, e),
    })
}

const FIND_USER_BY_EMAIL: &str = r#"
    SELECT to_jsonb(u.id)::text AS id, u.email, u.first_name, u.last_name,
           to_jsonb(u.role_id)::text AS role_id, u.created_date,
           to_jsonb(r.id)::text AS joined_role_id, r.role_name
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
    WHERE u.email = $1
    LIMIT 1
"#;

const FIND_ROLE_BY_NAME: &str = r#"
    SELECT to_jsonb(id)::text AS id, role_name
    FROM roles
    WHERE role_name = $1
    LIMIT 1
"#;

const CREATE_USER: &str = r#"
    WITH role AS (
        SELECT id, role_name FROM roles WHERE id::text = $4
    ), inserted AS (
        INSERT INTO users (email, first_name, last_name, role_id, created_date)
        SELECT $1, $2, $3, role.id, $5 FROM role
        RETURNING id, email, first_name, last_name, role_id, created_date
    )
    SELECT to_jsonb(i.id)::text AS id, i.email, i.first_name, i.last_name,
           to_jsonb(i.role_id)::text AS role_id, i.created_date,
           to_jsonb(role.id)::text AS joined_role_id, role.role_name
    FROM inserted i
    JOIN role ON role.id = i.role_id
"#;

/// Row type for role queries.
#[derive(FromRow)]
struct RoleRow {
    id: String,
    role_name: Option<String>,
}

/// Postgres repository for the `users` and `roles` tables.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool lazily; the first query opens the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn connect_lazy(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)
            .map_err(|e| DirectoryError::Configuration {
                details: format!("invalid database URL: {}", e),
            })?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let row: Option<UserRow> = sqlx::query_as(FIND_USER_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DirectoryError::from)
            .inspect_err(|e| error!(error = %e, "failed to fetch user"))?;

        debug!(found = row.is_some(), "user lookup");
        Ok(row.map(UserRow::into_user).transpose()?)
    }

    #[instrument(skip(self))]
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DirectoryError> {
        let row: Option<RoleRow> = sqlx::query_as(FIND_ROLE_BY_NAME)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(DirectoryError::from)
            .inspect_err(|e| error!(error = %e, "failed to fetch role"))?;

        let role = match row {
            Some(r) => Some(Role::new(decode_key(&r.id)?, r.role_name.unwrap_or_default())),
            None => None,
        };
        Ok(role)
    }

    #[instrument(skip(self, full_name))]
    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role_id: &RoleId,
    ) -> Result<User, DirectoryError> {
        let new_user = NewUser::new(email, full_name, role_id);

        let row: Option<UserRow> = sqlx::query_as(CREATE_USER)
            .bind(&new_user.email)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.role_id.to_string())
            .bind(new_user.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(DirectoryError::from)
            .inspect_err(|e| error!(error = %e, "failed to create user"))?;

        let user = row.map(UserRow::into_user).transpose()?.ok_or_else(|| {
            error!(role_id = %role_id, "insert referenced a missing role");
            DirectoryError::UnknownRole {
                role_id: role_id.to_string(),
            }
        })?;

        Ok(user)
    }
}
