//! Value objects: identifiers that must never be empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, rejecting empty or whitespace-only input
            pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                Ok(Self(value))
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier and return the inner string
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a chat room; one live connection is scoped to it.
    RoomId,
    "room id"
);

string_id!(
    /// Identifier of a user (the `User` field on the wire).
    UserId,
    "user id"
);

string_id!(
    /// Identifier of a message, server-assigned or a local placeholder.
    MessageId,
    "message id"
);

impl MessageId {
    /// Prefix of locally generated placeholder ids
    pub const PLACEHOLDER_PREFIX: &'static str = "local-";

    /// Generate a locally-unique placeholder for messages that arrive without an id.
    ///
    /// Not stable across reconnects or replays.
    pub fn placeholder() -> Self {
        Self(format!(
            "{}{}",
            Self::PLACEHOLDER_PREFIX,
            uuid::Uuid::new_v4()
        ))
    }

    /// Whether this id was synthesized locally
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(Self::PLACEHOLDER_PREFIX)
    }
}

/// Session credential issued by the authentication collaborator.
///
/// Sent as the `Cookie` header of the WebSocket handshake; never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a cookie header value such as `session=abc123`
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("credential"));
        }
        Ok(Self(value))
    }

    /// The raw header value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
