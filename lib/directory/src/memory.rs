//! In-process directory for development and tests.

use async_trait::async_trait;
use campus_login_access::{NewUser, Role, User};
use campus_login_core::{Result, RoleId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::UserDirectory;
use crate::error::DirectoryError;

#[derive(Default)]
struct Tables {
    roles: HashMap<RoleId, Role>,
    /// Users keyed by email; the join is resolved on read.
    users: HashMap<String, StoredUser>,
}

#[derive(Clone)]
struct StoredUser {
    id: UserId,
    first_name: Option<String>,
    last_name: Option<String>,
    role_id: Option<RoleId>,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Tables {
    fn joined(&self, email: &str, stored: &StoredUser) -> User {
        let role = stored
            .role_id
            .as_ref()
            .and_then(|id| self.roles.get(id))
            .cloned();

        User::with_all_fields(
            stored.id.clone(),
            email.to_string(),
            stored.first_name.clone(),
            stored.last_name.clone(),
            stored.role_id.clone(),
            role,
            stored.created_at,
        )
    }
}

/// A directory held in memory.
///
/// Clones share the same tables. `set_unavailable(true)` makes every call
/// fail, which stands in for an outage.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    tables: Arc<RwLock<Tables>>,
    next_id: Arc<AtomicI64>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn check_available(&self) -> Result<(), DirectoryError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(DirectoryError::Unavailable {
                details: "in-memory directory marked unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Adds a role row and returns it.
    pub async fn insert_role(&self, role_name: &str) -> Role {
        let role = Role::new(RoleId::from(self.next_id()), role_name.to_string());
        self.tables
            .write()
            .await
            .roles
            .insert(role.id().clone(), role.clone());
        role
    }

    /// Adds or replaces a user row, bypassing role checks.
    pub async fn insert_user(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        role_id: Option<&RoleId>,
    ) -> UserId {
        let id = UserId::from(self.next_id());
        let stored = StoredUser {
            id: id.clone(),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
            role_id: role_id.cloned(),
            created_at: Some(chrono::Utc::now()),
        };
        self.tables
            .write()
            .await
            .users
            .insert(email.to_string(), stored);
        id
    }

    /// Renames a role in place.
    pub async fn rename_role(&self, role_id: &RoleId, role_name: &str) {
        let mut tables = self.tables.write().await;
        if let Some(role) = tables.roles.get_mut(role_id) {
            *role = Role::new(role_id.clone(), role_name.to_string());
        }
    }

    /// Deletes a user row.
    pub async fn remove_user(&self, email: &str) {
        self.tables.write().await.users.remove(email);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(email)
            .map(|stored| tables.joined(email, stored)))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DirectoryError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .find(|role| role.role_name() == name)
            .cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role_id: &RoleId,
    ) -> Result<User, DirectoryError> {
        self.check_available()?;
        let new_user = NewUser::new(email, full_name, role_id);
        let id = UserId::from(self.next_id());

        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&new_user.role_id) {
            return Err(DirectoryError::UnknownRole {
                role_id: role_id.to_string(),
            }
            .into());
        }

        let stored = StoredUser {
            id,
            first_name: Some(new_user.first_name),
            last_name: Some(new_user.last_name),
            role_id: Some(new_user.role_id),
            created_at: Some(new_user.created_at),
        };
        tables.users.insert(new_user.email.clone(), stored.clone());
        Ok(tables.joined(&new_user.email, &stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_seeded_user_with_role() {
        let directory = MemoryDirectory::new();
        let role = directory.insert_role("Faculty").await;
        directory
            .insert_user("grace@campus.edu", Some("Grace"), Some("Hopper"), Some(role.id()))
            .await;

        let user = directory
            .find_user_by_email("grace@campus.edu")
            .await
            .expect("lookup")
            .expect("user exists");

        assert_eq!(user.role_name(), Some("Faculty"));
        assert_eq!(user.full_name(), "Grace Hopper");
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let directory = MemoryDirectory::new();
        directory.insert_user("ada@campus.edu", None, None, None).await;

        let miss = directory
            .find_user_by_email("ADA@campus.edu")
            .await
            .expect("lookup");
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn find_role_by_name() {
        let directory = MemoryDirectory::new();
        let admin = directory.insert_role("Admin").await;

        let found = directory.find_role_by_name("Admin").await.expect("lookup");
        assert_eq!(found, Some(admin));
        assert!(directory.find_role_by_name("admin").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn create_user_splits_name() {
        let directory = MemoryDirectory::new();
        let student = directory.insert_role("Student").await;

        let user = directory
            .create_user("ada@campus.edu", "Ada Lovelace", student.id())
            .await
            .expect("insert");
        assert_eq!(user.first_name(), Some("Ada"));
        assert_eq!(user.last_name(), Some("Lovelace"));
        assert_eq!(user.role_name(), Some("Student"));
        assert!(user.created_at().is_some());

        let single = directory
            .create_user("madonna@campus.edu", "Madonna", student.id())
            .await
            .expect("insert");
        assert_eq!(single.first_name(), Some("Madonna"));
        assert_eq!(single.last_name(), Some(""));
    }

    #[tokio::test]
    async fn create_user_with_missing_role_fails() {
        let directory = MemoryDirectory::new();
        let result = directory
            .create_user("ada@campus.edu", "Ada Lovelace", &RoleId::from(404))
            .await;
        assert!(result.is_err());
        assert!(
            directory
                .find_user_by_email("ada@campus.edu")
                .await
                .expect("lookup")
                .is_none()
        );
    }

    #[tokio::test]
    async fn outage_is_an_error() {
        let directory = MemoryDirectory::new();
        directory.insert_user("ada@campus.edu", None, None, None).await;
        directory.set_unavailable(true);

        assert!(directory.find_user_by_email("ada@campus.edu").await.is_err());
        assert!(directory.find_role_by_name("Student").await.is_err());

        directory.set_unavailable(false);
        assert!(
            directory
                .find_user_by_email("ada@campus.edu")
                .await
                .expect("lookup")
                .is_some()
        );
    }
}
