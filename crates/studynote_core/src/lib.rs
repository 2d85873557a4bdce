//! Core persistence crate for the StudyNote study planner.
//! Owns storage, business rules and the request/response boundary.

pub mod config;
pub mod db;
pub mod ipc;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ServiceConfig, StorageBackend};
pub use ipc::{ClientError, ClientResult, ServiceClient, ServiceHost};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::user::UserContext;
pub use model::{
    AssignmentId, DeleteOutcome, EntityKind, ExamId, NoteId, SubjectId, TagId, UserId,
};
pub use repo::memory_store::MemoryStore;
pub use repo::sqlite_store::SqliteStore;
pub use repo::{RepoError, RepoResult, Store};
pub use service::{PersistenceService, ServiceError, ServiceResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
