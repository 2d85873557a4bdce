//! Note domain model.
//!
//! # Invariants
//! - `tags` is a resolved join over `note_tags`, never a stored column.
//! - `tags` is ordered by tag id.
//! - `updated_at >= created_at`, both in epoch milliseconds.

use super::label::Tag;
use super::{NoteId, SubjectId, TagId, UserId};
use serde::{Deserialize, Serialize};

/// Note with its associated tags resolved to full tag rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// `None` when no subject was chosen or the subject was deleted.
    pub subject_id: Option<SubjectId>,
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
    pub tags: Vec<Tag>,
}

impl Note {
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|tag| tag.id).collect()
    }
}

/// Create input. `tag_ids` travels as `tags` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    pub user_id: UserId,
    #[serde(default, rename = "tags")]
    pub tag_ids: Vec<TagId>,
}

/// Full-replace update input: the tag set replaces every existing
/// association of the note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteChanges {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default, rename = "tags")]
    pub tag_ids: Vec<TagId>,
}
