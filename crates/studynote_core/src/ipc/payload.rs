//! Request payload shapes that are not already model input types.
//!
//! All keys are camelCase on the wire.
//!
//! Single-id and owner-only channels also accept the bare scalar
//! (`3` instead of `{"id": 3}`), and note-tag links accept a
//! `[noteId, tagId]` pair. Encoding always uses the object form.

use crate::model::{NoteId, SubjectId, TagId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OwnerForm")]
pub struct OwnerQuery {
    pub user_id: UserId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OwnerForm {
    Bare(UserId),
    Object {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

impl From<OwnerForm> for OwnerQuery {
    fn from(value: OwnerForm) -> Self {
        match value {
            OwnerForm::Bare(user_id) | OwnerForm::Object { user_id } => Self { user_id },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSubjectQuery {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<SubjectId>,
}

/// `{ "id": n }` (or bare `n`) for get and delete channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IdForm<I>")]
pub struct IdPayload<I> {
    pub id: I,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdForm<I> {
    Bare(I),
    Object { id: I },
}

impl<I> From<IdForm<I>> for IdPayload<I> {
    fn from(value: IdForm<I>) -> Self {
        match value {
            IdForm::Bare(id) | IdForm::Object { id } => Self { id },
        }
    }
}

/// Update payloads: the target id next to the flattened change fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithId<I, T> {
    pub id: I,
    #[serde(flatten)]
    pub fields: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NoteTagForm")]
pub struct NoteTagPayload {
    pub note_id: NoteId,
    pub tag_id: TagId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NoteTagForm {
    Pair(NoteId, TagId),
    Object {
        #[serde(rename = "noteId")]
        note_id: NoteId,
        #[serde(rename = "tagId")]
        tag_id: TagId,
    },
}

impl From<NoteTagForm> for NoteTagPayload {
    fn from(value: NoteTagForm) -> Self {
        match value {
            NoteTagForm::Pair(note_id, tag_id) | NoteTagForm::Object { note_id, tag_id } => {
                Self { note_id, tag_id }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NoteIdForm")]
pub struct NoteIdPayload {
    pub note_id: NoteId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NoteIdForm {
    Bare(NoteId),
    Object {
        #[serde(rename = "noteId")]
        note_id: NoteId,
    },
}

impl From<NoteIdForm> for NoteIdPayload {
    fn from(value: NoteIdForm) -> Self {
        match value {
            NoteIdForm::Bare(note_id) | NoteIdForm::Object { note_id } => Self { note_id },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload<I> {
    pub id: I,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPayload<I> {
    pub id: I,
    pub progress: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
    pub user_id: UserId,
    pub from: NaiveDate,
    pub to: NaiveDate,
}
