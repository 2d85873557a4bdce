//! Subject and tag repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Owner-scoped lists include the caller's rows plus ownerless defaults,
//!   ordered by id.
//! - Deleting a tag removes its `note_tags` rows in the same transaction.
//! - Deleting a subject detaches (nulls `subject_id` on) dependent notes,
//!   assignments and exams in the same transaction.

use super::sqlite_store::{ensure_exists, SqliteStore};
use super::{RepoError, RepoResult};
use crate::model::label::{LabelChanges, NewLabel, Subject, Tag};
use crate::model::{EntityKind, SubjectId, TagId, UserId};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

pub trait SubjectRepository {
    fn list_subjects(&self, owner: UserId) -> RepoResult<Vec<Subject>>;
    fn create_subject(&mut self, input: &NewLabel) -> RepoResult<Subject>;
    fn update_subject(&mut self, id: SubjectId, changes: &LabelChanges) -> RepoResult<Subject>;
    /// Returns `false` when no row had this id.
    fn delete_subject(&mut self, id: SubjectId) -> RepoResult<bool>;
}

pub trait TagRepository {
    fn list_tags(&self, owner: UserId) -> RepoResult<Vec<Tag>>;
    fn create_tag(&mut self, input: &NewLabel) -> RepoResult<Tag>;
    fn update_tag(&mut self, id: TagId, changes: &LabelChanges) -> RepoResult<Tag>;
    /// Returns `false` when no row had this id.
    fn delete_tag(&mut self, id: TagId) -> RepoResult<bool>;
}

/// Column tuple shared by `subjects` and `tags`.
struct LabelRow {
    id: i64,
    name: String,
    color: String,
    user_id: Option<i64>,
}

impl From<LabelRow> for Subject {
    fn from(row: LabelRow) -> Self {
        Self {
            id: SubjectId(row.id),
            name: row.name,
            color: row.color,
            user_id: row.user_id.map(UserId),
        }
    }
}

impl From<LabelRow> for Tag {
    fn from(row: LabelRow) -> Self {
        Self {
            id: TagId(row.id),
            name: row.name,
            color: row.color,
            user_id: row.user_id.map(UserId),
        }
    }
}

impl SubjectRepository for SqliteStore {
    fn list_subjects(&self, owner: UserId) -> RepoResult<Vec<Subject>> {
        Ok(list_labels(&self.conn, "subjects", owner)?
            .into_iter()
            .map(Subject::from)
            .collect())
    }

    fn create_subject(&mut self, input: &NewLabel) -> RepoResult<Subject> {
        let id = insert_label(&self.conn, "subjects", input)?;
        Ok(Subject {
            id: SubjectId(id),
            name: input.name.clone(),
            color: input.color.clone(),
            user_id: Some(input.user_id),
        })
    }

    fn update_subject(&mut self, id: SubjectId, changes: &LabelChanges) -> RepoResult<Subject> {
        update_label(&self.conn, "subjects", EntityKind::Subject, id.get(), changes)
            .map(Subject::from)
    }

    fn delete_subject(&mut self, id: SubjectId) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for table in ["notes", "assignments", "exams"] {
            tx.execute(
                &format!("UPDATE {table} SET subject_id = NULL WHERE subject_id = ?1;"),
                [id.get()],
            )?;
        }
        let removed = tx.execute("DELETE FROM subjects WHERE id = ?1;", [id.get()])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

impl TagRepository for SqliteStore {
    fn list_tags(&self, owner: UserId) -> RepoResult<Vec<Tag>> {
        Ok(list_labels(&self.conn, "tags", owner)?
            .into_iter()
            .map(Tag::from)
            .collect())
    }

    fn create_tag(&mut self, input: &NewLabel) -> RepoResult<Tag> {
        let id = insert_label(&self.conn, "tags", input)?;
        Ok(Tag {
            id: TagId(id),
            name: input.name.clone(),
            color: input.color.clone(),
            user_id: Some(input.user_id),
        })
    }

    fn update_tag(&mut self, id: TagId, changes: &LabelChanges) -> RepoResult<Tag> {
        update_label(&self.conn, "tags", EntityKind::Tag, id.get(), changes).map(Tag::from)
    }

    fn delete_tag(&mut self, id: TagId) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM note_tags WHERE tag_id = ?1;", [id.get()])?;
        let removed = tx.execute("DELETE FROM tags WHERE id = ?1;", [id.get()])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

fn list_labels(conn: &Connection, table: &str, owner: UserId) -> RepoResult<Vec<LabelRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, color, user_id
         FROM {table}
         WHERE user_id = ?1 OR user_id IS NULL
         ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([owner.get()])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(LabelRow {
            id: row.get("id")?,
            name: row.get("name")?,
            color: row.get("color")?,
            user_id: row.get("user_id")?,
        });
    }
    Ok(labels)
}

fn insert_label(conn: &Connection, table: &str, input: &NewLabel) -> RepoResult<i64> {
    ensure_exists(conn, EntityKind::User, input.user_id.get())?;
    conn.execute(
        &format!("INSERT INTO {table} (name, color, user_id) VALUES (?1, ?2, ?3);"),
        params![input.name, input.color, input.user_id.get()],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_label(
    conn: &Connection,
    table: &str,
    entity: EntityKind,
    id: i64,
    changes: &LabelChanges,
) -> RepoResult<LabelRow> {
    let changed = conn.execute(
        &format!("UPDATE {table} SET name = ?1, color = ?2 WHERE id = ?3;"),
        params![changes.name, changes.color, id],
    )?;
    if changed == 0 {
        return Err(RepoError::not_found(entity, id));
    }

    conn.query_row(
        &format!("SELECT id, name, color, user_id FROM {table} WHERE id = ?1;"),
        [id],
        |row| {
            Ok(LabelRow {
                id: row.get("id")?,
                name: row.get("name")?,
                color: row.get("color")?,
                user_id: row.get("user_id")?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| RepoError::not_found(entity, id))
}
