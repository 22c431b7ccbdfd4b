// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Identifier abstractions.
//!
//! Colonies identifiers are opaque 128-bit random values rendered as a
//! 4-character type prefix followed by a 20-character alphanumeric suffix.

/// Maximum byte length for a rendered ID (4-char prefix + 20-char suffix).
pub const ID_MAX_LEN: usize = 24;

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    let end = n.min(s.len());
    &s[..end]
}

/// Define a newtype ID wrapper with a type prefix.
///
/// Generates `new()` for random generation, `from_string()` for parsing,
/// `Display`, `From<String>`/`From<&str>`, `Deref<Target = str>` and
/// `Borrow<str>` so IDs can be used directly as `HashMap` keys and looked
/// up by `&str` without allocating.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random id with the type prefix.
            pub fn new() -> Self {
                Self(format!("{}{}", Self::PREFIX, nanoid::nanoid!(20)))
            }

            /// Construct an id from an existing string (parsing/deserialization).
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns a string slice of this id truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(&self.0, n)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}
