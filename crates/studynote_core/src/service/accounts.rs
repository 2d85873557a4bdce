//! Registration and login.
//!
//! Usernames are trimmed before they are stored or looked up; passwords are
//! passed through untouched.

use super::{log_write, PersistenceService, ServiceError, ServiceResult};
use crate::model::user::UserContext;
use crate::model::validation::require_text;
use crate::repo::Store;
use std::time::Instant;

impl<S: Store> PersistenceService<S> {
    /// Creates a user; `Conflict` when the username is already registered.
    pub fn register(&mut self, username: &str, password: &str) -> ServiceResult<UserContext> {
        let started = Instant::now();
        let result = require_text("username", username)
            .map_err(ServiceError::from)
            .and_then(|username| Ok(self.store.create_user(&username, password)?));
        if let Ok(user) = &result {
            log::debug!("event=user_register module=service user_id={}", user.id);
        }
        log_write("user_register", "service", started, result)
    }

    /// Resolves credentials to a user; `InvalidCredentials` on any mismatch.
    pub fn login(&self, username: &str, password: &str) -> ServiceResult<UserContext> {
        let started = Instant::now();
        let result = self
            .store
            .find_by_credentials(username.trim(), password)
            .map_err(ServiceError::from)
            .and_then(|found| found.ok_or(ServiceError::InvalidCredentials));
        log_write("user_login", "service", started, result)
    }
}
