//! Registered users and the explicit caller context.

use super::UserId;
use serde::{Deserialize, Serialize};

/// Identity returned by `register`/`login`.
///
/// Callers pass `id` explicitly to every owner-scoped operation; there is no
/// process-wide "current user". The password is never part of this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: UserId,
    pub username: String,
}
