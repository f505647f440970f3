//! Shared identifier types for the reweave stack.
//!
//! Frame, target and session identifiers are opaque strings handed out by the
//! browser over the devtools protocol; the newtypes exist so they cannot be
//! mixed up across the bridge/locator boundary. `new()` mints a fresh random
//! identifier, which fakes and tests use in place of protocol-issued ones.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one frame in the page's frame tree.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub String);

/// Identifier of a devtools target (a page or an out-of-process iframe).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

/// Identifier of a devtools session attached to one target.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(FrameId);
string_id!(TargetId);
string_id!(SessionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings() {
        let frame = FrameId::from("frame-7");
        assert_eq!(frame.as_str(), "frame-7");
        assert_eq!(frame.to_string(), "frame-7");
        assert_eq!(frame, FrameId::from("frame-7".to_string()));
    }

    #[test]
    fn minted_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_ne!(TargetId::new(), TargetId::new());
    }
}
