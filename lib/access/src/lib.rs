//! Domain types for signing users into the campus platform.
//!
//! This crate provides:
//! - Directory records (`User`, `Role`) and the insert form (`NewUser`)
//! - The closed set of recognized roles (`RoleName`) and their dashboards
//! - Session snapshots (`SessionUser`, `Session`)
//! - Identity provider configuration and claims (`OidcConfig`, `OidcClaims`)
//! - The client-visible reasons a sign-in can fail (`AuthFailure`)
//!
//! # Example
//!
//! ```
//! use campus_login_access::{Role, RoleName, Session, SessionUser, User};
//! use campus_login_core::{RoleId, UserId};
//! use chrono::Duration;
//!
//! let role = Role::new(RoleId::from(1), "Faculty".to_string());
//! let user = User::with_all_fields(
//!     UserId::from(10),
//!     "grace@campus.edu".to_string(),
//!     Some("Grace".to_string()),
//!     Some("Hopper".to_string()),
//!     Some(RoleId::from(1)),
//!     Some(role),
//!     None,
//! );
//!
//! let role_name = user.role_name().expect("linked role").parse::<RoleName>().expect("recognized");
//! assert_eq!(role_name.dashboard_path(), "/faculty-dashboard");
//!
//! let snapshot = SessionUser::new(user.id().clone(), user.email().to_string(), user.full_name(), role_name);
//! let session = Session::new(snapshot, Duration::hours(1));
//! assert_eq!(session.user().name(), "Grace Hopper");
//! assert!(!session.is_expired());
//! ```

pub mod auth;
pub mod error;
pub mod oidc;
pub mod role;
pub mod session;
pub mod user;

// Re-export main types at crate root
pub use auth::{OidcClaims, SignIn};
pub use error::{AuthFailure, UnknownRoleName};
pub use oidc::{OidcConfig, OidcConfigBuilder};
pub use role::{Role, RoleName};
pub use session::{Session, SessionUser};
pub use user::{NewUser, User, split_full_name};
