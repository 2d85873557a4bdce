//! SQLite-backed store.
//!
//! # Invariants
//! - The wrapped connection has been bootstrapped by [`crate::db`].
//! - Multi-table writes run in `IMMEDIATE` transactions.

use super::{RepoError, RepoResult};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::EntityKind;
use rusqlite::Connection;
use std::path::Path;

/// Production store owning one bootstrapped connection.
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Opens (and if needed creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database with the full schema.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps a connection already bootstrapped with `open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub(crate) fn table_for(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::User => "users",
        EntityKind::Subject => "subjects",
        EntityKind::Tag => "tags",
        EntityKind::Note => "notes",
        EntityKind::Assignment => "assignments",
        EntityKind::Exam => "exams",
    }
}

pub(crate) fn row_exists(conn: &Connection, entity: EntityKind, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            table_for(entity)
        ),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Fails with `NotFound` naming `entity` when the row is absent.
pub(crate) fn ensure_exists(conn: &Connection, entity: EntityKind, id: i64) -> RepoResult<()> {
    if row_exists(conn, entity, id)? {
        Ok(())
    } else {
        Err(RepoError::not_found(entity, id))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
