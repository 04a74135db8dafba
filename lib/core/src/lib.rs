//! Core types shared across the campus-login crates.
//!
//! Identifiers here name rows owned by the external user directory, so
//! they are opaque: this service never mints them, only carries them.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{RoleId, UserId};
