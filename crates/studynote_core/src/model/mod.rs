//! Domain model for the study planner.
//!
//! # Responsibility
//! - Define the canonical records returned by storage and the service.
//! - Define the input shapes accepted by write operations.
//!
//! # Invariants
//! - Identifiers are positive integers assigned by storage, unique per entity.
//! - Stored rows serialize with snake_case keys; write inputs deserialize from
//!   camelCase keys, matching the request payloads callers send.
//! - Owned rows carry their `user_id`; shared defaults carry `None`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod calendar;
pub mod coursework;
pub mod label;
pub mod note;
pub mod user;
pub mod validation;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw integer key.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Registered user key.
    UserId
);
entity_id!(
    /// Subject key.
    SubjectId
);
entity_id!(
    /// Tag key.
    TagId
);
entity_id!(
    /// Note key.
    NoteId
);
entity_id!(
    /// Assignment key.
    AssignmentId
);
entity_id!(
    /// Exam key.
    ExamId
);

/// Entity family, used to name the subject of `NotFound` failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Subject,
    Tag,
    Note,
    Assignment,
    Exam,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Subject => "subject",
            Self::Tag => "tag",
            Self::Note => "note",
            Self::Assignment => "assignment",
            Self::Exam => "exam",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a delete call: `success=false` means the row did not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

impl DeleteOutcome {
    pub fn from_removed(removed: bool) -> Self {
        Self { success: removed }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, NoteId};

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&NoteId(42)).unwrap();
        assert_eq!(json, "42");
        let parsed: NoteId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, NoteId(7));
    }

    #[test]
    fn entity_kind_uses_snake_case_labels() {
        assert_eq!(
            serde_json::to_string(&EntityKind::Assignment).unwrap(),
            "\"assignment\""
        );
        assert_eq!(EntityKind::Tag.to_string(), "tag");
    }
}
