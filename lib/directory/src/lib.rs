//! User directory adapters for campus-login.
//!
//! The directory is an external store holding `users` and `roles` rows.
//! This service reads it to decide who may sign in and which role they
//! hold. Three backends implement [`UserDirectory`]:
//!
//! - [`RestDirectory`]: the hosted PostgREST row API, keyed by an API key
//! - [`PgDirectory`]: the same tables over a direct Postgres connection
//! - [`MemoryDirectory`]: an in-process store for development and tests
//!
//! Lookups distinguish "no such row" (`Ok(None)`) from "the directory
//! failed" (`Err`), so callers never report an outage as a refusal.

pub mod error;
pub mod memory;
pub mod postgres;
mod record;
pub mod rest;

use async_trait::async_trait;
use campus_login_access::{Role, User};
use campus_login_core::{Result, RoleId};

pub use error::DirectoryError;
pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;
pub use rest::RestDirectory;

/// Read and insert access to the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds the user with this exact email, joined with their role.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    /// Finds the role with this exact name.
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DirectoryError>;

    /// Inserts a user, splitting `full_name` on its first space.
    ///
    /// Returns the inserted row with its joined role.
    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role_id: &RoleId,
    ) -> Result<User, DirectoryError>;
}
