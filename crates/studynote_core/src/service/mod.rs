//! Persistence service: use-case APIs over a [`Store`].
//!
//! # Responsibility
//! - Validate and normalize caller input before storage is touched.
//! - Translate storage failures into the service error taxonomy.
//! - Emit metadata-only diagnostics for every write.
//!
//! # Invariants
//! - Every owner-scoped call receives the owner explicitly.
//! - Failures are terminal for their call; nothing is retried.
//! - Logged fields never include titles, content or passwords.

use crate::model::validation::ValidationError;
use crate::model::EntityKind;
use crate::repo::{RepoError, Store};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod accounts;
mod calendar;
mod coursework;
mod labels;
mod notes;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure taxonomy shared by the service and its remote clients.
#[derive(Debug)]
pub enum ServiceError {
    /// Uniqueness violated, e.g. a taken username.
    Conflict(String),
    /// Username/password pair did not match a user.
    InvalidCredentials,
    /// Target or referenced row does not exist.
    NotFound { entity: EntityKind, id: i64 },
    /// Input rejected before storage was touched.
    Validation(ValidationError),
    /// Storage-layer failure; the write was rolled back.
    StorageFailure(RepoError),
}

impl ServiceError {
    pub fn not_found(entity: EntityKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::UsernameTaken(username) => {
                Self::Conflict(format!("username already exists: {username}"))
            }
            other => Self::StorageFailure(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Service facade over one store implementation.
///
/// Operations are grouped by aggregate across the private submodules of
/// this module; all of them live on this one type.
pub struct PersistenceService<S: Store> {
    store: S,
}

impl<S: Store> PersistenceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

/// Short label for log lines; never the message text itself.
pub(crate) fn error_kind(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::Conflict(_) => "conflict",
        ServiceError::InvalidCredentials => "invalid_credentials",
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::Validation(_) => "validation",
        ServiceError::StorageFailure(_) => "storage_failure",
    }
}

/// Logs the outcome of one write and passes the result through.
pub(crate) fn log_write<T>(
    event: &str,
    module: &str,
    started: std::time::Instant,
    result: ServiceResult<T>,
) -> ServiceResult<T> {
    let duration_ms = started.elapsed().as_millis();
    match &result {
        Ok(_) => log::info!(
            "event={event} module={module} status=ok duration_ms={duration_ms}"
        ),
        Err(err) => log::warn!(
            "event={event} module={module} status=error error_kind={} duration_ms={duration_ms}",
            error_kind(err)
        ),
    }
    result
}
