//! Subjects and tags: named, colored labels owned by a user.
//!
//! Both share the same lifecycle. Rows with `user_id = None` are seeded
//! defaults visible to every user.

use super::{SubjectId, TagId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// CSS color value.
    pub color: String,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// CSS color value.
    pub color: String,
    pub user_id: Option<UserId>,
}

/// Create input shared by subjects and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    pub name: String,
    pub color: String,
    pub user_id: UserId,
}

/// Update input shared by subjects and tags. The owner never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelChanges {
    pub name: String,
    pub color: String,
}

impl NewLabel {
    pub fn new(name: impl Into<String>, color: impl Into<String>, user_id: UserId) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            user_id,
        }
    }
}

impl LabelChanges {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}
