//! Identifier types for rows owned by the user directory.
//!
//! The directory decides the key type (integer sequence or UUID). Ids keep
//! the JSON shape they arrived in: an integer key serializes back as a
//! number and a text key as a string, so the session snapshot hands the
//! front-end the same value the directory returned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A directory key in its original JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum Key {
    Integer(i64),
    Text(String),
}

/// Macro to generate an opaque identifier wrapper around a directory key.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Key);

        impl $name {
            /// Wraps a text key such as a UUID.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(Key::Text(id.into()))
            }

            /// Returns the key when the directory uses integer ids.
            #[must_use]
            pub fn as_integer(&self) -> Option<i64> {
                match &self.0 {
                    Key::Integer(n) => Some(*n),
                    Key::Text(_) => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    Key::Integer(n) => write!(f, "{}", n),
                    Key::Text(s) => f.write_str(s),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Key::Text(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(Key::Text(s.to_string()))
            }
        }

        impl From<i64> for $name {
            fn from(n: i64) -> Self {
                Self(Key::Integer(n))
            }
        }
    };
}

define_id!(
    /// Unique identifier of a row in the `users` table.
    UserId
);

define_id!(
    /// Unique identifier of a row in the `roles` table.
    RoleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_string_key() {
        let id: UserId =
            serde_json::from_str("\"3f1c2a9e-0b7d-4a51-9a43-5d2e4c1f7b80\"").expect("deserialize");
        assert_eq!(id, UserId::new("3f1c2a9e-0b7d-4a51-9a43-5d2e4c1f7b80"));
        assert_eq!(id.as_integer(), None);
    }

    #[test]
    fn deserializes_from_integer_key() {
        let id: RoleId = serde_json::from_str("42").expect("deserialize");
        assert_eq!(id, RoleId::from(42));
        assert_eq!(id.as_integer(), Some(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn keeps_the_json_shape() {
        assert_eq!(serde_json::to_string(&UserId::from(7)).expect("serialize"), "7");
        assert_eq!(serde_json::to_string(&UserId::new("7")).expect("serialize"), "\"7\"");
        assert_ne!(UserId::from(7), UserId::new("7"));
    }

    #[test]
    fn rejects_non_scalar_key() {
        let result: Result<UserId, _> = serde_json::from_str("{\"id\": 1}");
        assert!(result.is_err());
    }
}
