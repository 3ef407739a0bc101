//! Typed identifiers for domain entities.
//!
//! Each id is a newtype so a pool entry key can never be passed where a
//! session id was expected.
//!
//! # Example
//!
//! ```rust
//! use agree_core::common::{EntryKey, SessionId};
//!
//! let entry_key = EntryKey::new();
//! let session_id = SessionId::new();
//!
//! // This would be a compile error:
//! // let wrong: SessionId = entry_key;
//! # let _ = (entry_key, session_id);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declares a UUID-backed id type (v7, time ordered).
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[inline]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[inline]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses an id from its hyphenated string form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(
    /// Key assigned by the waiting pool to one waiting entry.
    EntryKey
);

uuid_id!(
    /// Registered member (user account).
    MemberId
);

uuid_id!(
    /// Server-side session, named by the `sid` claim of a token.
    SessionId
);

/// Token naming the chat channel shared by two matched members.
///
/// Opaque to everything but the matching domain, which derives it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
