//! Versioned schema bootstrap.
//!
//! # Responsibility
//! - Create all seven tables on a fresh database in one transaction.
//! - Refuse databases written by a newer build.
//!
//! # Invariants
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - There is exactly one schema version; upgrades are not supported.

use crate::db::DbResult;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema_v1.sql");

/// Tables created by the schema, in dependency order.
pub const TABLES: [&str; 7] = [
    "users",
    "subjects",
    "tags",
    "notes",
    "note_tags",
    "assignments",
    "exams",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// `user_version` is ahead of [`SCHEMA_VERSION`].
    TooNew { found: u32, supported: u32 },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooNew { found, supported } => write!(
                f,
                "database was written with schema v{found}; this build reads up to v{supported}"
            ),
        }
    }
}

impl Error for SchemaError {}

/// Creates the schema when the database is fresh; no-op when current.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(SchemaError::TooNew {
            found: current_version,
            supported: SCHEMA_VERSION,
        }
        .into());
    }

    if current_version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    Ok(())
}

pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
