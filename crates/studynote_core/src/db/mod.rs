//! SQLite storage bootstrap.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the study planner.
//! - Create the schema on first open and seed default subjects/tags.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Application data is never read or written before bootstrap succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod open;
pub mod schema;
pub mod seed;

pub use open::{open_db, open_db_in_memory};
pub use schema::SchemaError;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// The stored schema cannot be used by this build.
    Schema(SchemaError),
    /// Any other statement failed during bootstrap.
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open database `{}`: {source}", path.display())
            }
            Self::Schema(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "database bootstrap failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Schema(err) => Some(err),
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<SchemaError> for DbError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}
