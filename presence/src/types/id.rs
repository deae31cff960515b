//! Typed ID wrappers for compile-time type safety.
//!
//! Session and identity ids are opaque strings on the wire and in the store;
//! wrapping them prevents accidental mixing of the two.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MAX_ID_LEN: usize = 128;

/// Error returned when a raw string cannot be used as an identifier.
#[derive(Debug, thiserror::Error)]
#[error("identifier must be a non-empty single-line string of at most {MAX_ID_LEN} characters")]
pub struct IdParseError;

/// Macro to generate typed string-id wrappers with common trait implementations.
macro_rules! typed_str_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::Type)]
        #[sqlx(transparent)]
        pub struct $name(String);

        impl $name {
            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty()
                    || trimmed.len() > MAX_ID_LEN
                    || trimmed.chars().any(|c| c.is_control())
                {
                    return Err(IdParseError);
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                s.parse().expect("Invalid identifier string")
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_str_id!(SessionId, "Unique identifier for one live client instance.");
typed_str_id!(IdentityId, "Identifier of the authenticated principal owning a session.");

impl SessionId {
    /// Generates a fresh globally-unique id: login timestamp in millis plus
    /// a random hex suffix. No coordination required.
    pub fn generate() -> Self {
        let suffix: u32 = rand::random();
        Self(format!(
            "{}-{:08x}",
            chrono::Utc::now().timestamp_millis(),
            suffix
        ))
    }

    /// Returns true when `raw` has the `millis-hexsuffix` shape produced by
    /// [`SessionId::generate`]. Persisted ids failing this check are treated
    /// as corrupt and regenerated.
    pub fn is_well_formed(raw: &str) -> bool {
        match raw.split_once('-') {
            Some((millis, suffix)) => {
                !millis.is_empty()
                    && millis.chars().all(|c| c.is_ascii_digit())
                    && !suffix.is_empty()
                    && suffix.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }
}
