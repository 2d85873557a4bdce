//! User repository contract and SQLite implementation.
//!
//! Passwords are stored and compared verbatim. This is a known weakness of
//! the current scope, not a hashing scheme in disguise.

use super::sqlite_store::SqliteStore;
use super::{RepoError, RepoResult};
use crate::model::user::UserContext;
use crate::model::UserId;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

pub trait UserRepository {
    /// Inserts a user; fails with `UsernameTaken` on an exact duplicate.
    fn create_user(&mut self, username: &str, password: &str) -> RepoResult<UserContext>;
    /// Returns the user only when both username and password match exactly.
    fn find_by_credentials(&self, username: &str, password: &str)
        -> RepoResult<Option<UserContext>>;
}

impl UserRepository for SqliteStore {
    fn create_user(&mut self, username: &str, password: &str) -> RepoResult<UserContext> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let taken: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [username],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(RepoError::UsernameTaken(username.to_string()));
        }

        tx.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2);",
            params![username, password],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(UserContext {
            id: UserId(id),
            username: username.to_string(),
        })
    }

    fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RepoResult<Option<UserContext>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username
                 FROM users
                 WHERE username = ?1 AND password = ?2;",
                params![username, password],
                |row| {
                    Ok(UserContext {
                        id: UserId(row.get("id")?),
                        username: row.get("username")?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
