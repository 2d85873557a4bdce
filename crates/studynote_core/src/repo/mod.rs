//! Repository layer: storage contracts and their two implementations.
//!
//! # Responsibility
//! - Define one repository trait per aggregate, bundled as [`Store`].
//! - Provide a SQLite-backed store for production and an in-memory store for
//!   tests; both satisfy the same observable contract.
//!
//! # Invariants
//! - Writes that touch more than one table are all-or-nothing.
//! - Referenced rows (owner, subject, tags) are checked inside the write and
//!   reported as `NotFound` naming the missing entity.
//! - Repository APIs return semantic errors (`NotFound`, `UsernameTaken`) in
//!   addition to storage transport errors.

use crate::db::DbError;
use crate::model::{EntityKind, TagId};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod coursework_repo;
pub mod label_repo;
pub mod memory_store;
pub mod note_repo;
pub mod sqlite_store;
pub mod user_repo;

use coursework_repo::{AssignmentRepository, ExamRepository};
use label_repo::{SubjectRepository, TagRepository};
use note_repo::NoteRepository;
use user_repo::UserRepository;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { entity: EntityKind, id: i64 },
    UsernameTaken(String),
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(entity: EntityKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UsernameTaken(username) => write!(f, "username already exists: {username}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full persistence contract consumed by the service layer.
pub trait Store:
    UserRepository
    + SubjectRepository
    + TagRepository
    + NoteRepository
    + AssignmentRepository
    + ExamRepository
    + Send
{
}

impl<T> Store for T where
    T: UserRepository
        + SubjectRepository
        + TagRepository
        + NoteRepository
        + AssignmentRepository
        + ExamRepository
        + Send
{
}

/// Collapses duplicate tag ids; the association key is `(note_id, tag_id)`.
pub fn distinct_tag_ids(tag_ids: &[TagId]) -> Vec<TagId> {
    tag_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub(crate) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
