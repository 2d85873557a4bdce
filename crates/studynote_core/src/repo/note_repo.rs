//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist note rows together with their `note_tags` associations.
//! - Resolve associations into full tag rows on every read.
//!
//! # Invariants
//! - `create_note` and `update_note` write the row and its tag set in one
//!   transaction; a missing owner, subject or tag aborts the whole write.
//! - `update_note` replaces the full tag set (delete-all-then-insert).
//! - A note links only tags visible to its owner: the owner's own tags and
//!   the shared defaults. Any other tag id reads as missing.
//! - Note lists are ordered by `updated_at DESC, id DESC`; tags by id.

use super::sqlite_store::{ensure_exists, SqliteStore};
use super::{distinct_tag_ids, now_epoch_ms, RepoError, RepoResult};
use crate::model::label::Tag;
use crate::model::note::{NewNote, Note, NoteChanges};
use crate::model::{EntityKind, NoteId, SubjectId, TagId, UserId};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior,
};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    subject_id,
    user_id,
    created_at,
    updated_at
FROM notes";

pub trait NoteRepository {
    fn list_notes(&self, owner: UserId, subject: Option<SubjectId>) -> RepoResult<Vec<Note>>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn create_note(&mut self, input: &NewNote) -> RepoResult<Note>;
    /// Replaces fields and the whole tag set; `NotFound` when the note is absent.
    fn update_note(&mut self, id: NoteId, changes: &NoteChanges) -> RepoResult<Note>;
    /// Returns `false` when no row had this id.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool>;
    /// Idempotent single association insert.
    fn add_note_tag(&mut self, note: NoteId, tag: TagId) -> RepoResult<Note>;
    /// Removes one association if present.
    fn remove_note_tag(&mut self, note: NoteId, tag: TagId) -> RepoResult<Note>;
    fn note_tags(&self, note: NoteId) -> RepoResult<Vec<Tag>>;
}

impl NoteRepository for SqliteStore {
    fn list_notes(&self, owner: UserId, subject: Option<SubjectId>) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values = vec![Value::Integer(owner.get())];

        if let Some(subject) = subject {
            sql.push_str(" AND subject_id = ?");
            bind_values.push(Value::Integer(subject.get()));
        }
        sql.push_str(" ORDER BY updated_at DESC, id DESC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = load_tags_for_note(&self.conn, note.id)?;
            notes.push(note);
        }
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        load_note(&self.conn, id)
    }

    fn create_note(&mut self, input: &NewNote) -> RepoResult<Note> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_exists(&tx, EntityKind::User, input.user_id.get())?;
        if let Some(subject) = input.subject_id {
            ensure_exists(&tx, EntityKind::Subject, subject.get())?;
        }

        let now = now_epoch_ms();
        tx.execute(
            "INSERT INTO notes (title, content, subject_id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                input.title,
                input.content,
                input.subject_id.map(SubjectId::get),
                input.user_id.get(),
                now,
            ],
        )?;
        let note_id = NoteId(tx.last_insert_rowid());
        insert_tag_links(&tx, note_id, input.user_id, &input.tag_ids)?;

        let note = load_note(&tx, note_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created note {note_id} missing in read-back"))
        })?;
        tx.commit()?;
        Ok(note)
    }

    fn update_note(&mut self, id: NoteId, changes: &NoteChanges) -> RepoResult<Note> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = note_owner(&tx, id)?;
        if let Some(subject) = changes.subject_id {
            ensure_exists(&tx, EntityKind::Subject, subject.get())?;
        }

        let changed = tx.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                subject_id = ?4,
                updated_at = ?5
             WHERE id = ?1;",
            params![
                id.get(),
                changes.title,
                changes.content,
                changes.subject_id.map(SubjectId::get),
                now_epoch_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Note, id));
        }

        tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [id.get()])?;
        insert_tag_links(&tx, id, owner, &changes.tag_ids)?;

        let note = load_note(&tx, id)?.ok_or_else(|| RepoError::not_found(EntityKind::Note, id))?;
        tx.commit()?;
        Ok(note)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM note_tags WHERE note_id = ?1;", [id.get()])?;
        let removed = tx.execute("DELETE FROM notes WHERE id = ?1;", [id.get()])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn add_note_tag(&mut self, note: NoteId, tag: TagId) -> RepoResult<Note> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = note_owner(&tx, note)?;
        ensure_tag_visible(&tx, tag, owner)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?1, ?2);",
            params![note.get(), tag.get()],
        )?;
        if inserted > 0 {
            touch_note(&tx, note)?;
        }

        let loaded =
            load_note(&tx, note)?.ok_or_else(|| RepoError::not_found(EntityKind::Note, note))?;
        tx.commit()?;
        Ok(loaded)
    }

    fn remove_note_tag(&mut self, note: NoteId, tag: TagId) -> RepoResult<Note> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_exists(&tx, EntityKind::Note, note.get())?;

        let removed = tx.execute(
            "DELETE FROM note_tags WHERE note_id = ?1 AND tag_id = ?2;",
            params![note.get(), tag.get()],
        )?;
        if removed > 0 {
            touch_note(&tx, note)?;
        }

        let loaded =
            load_note(&tx, note)?.ok_or_else(|| RepoError::not_found(EntityKind::Note, note))?;
        tx.commit()?;
        Ok(loaded)
    }

    fn note_tags(&self, note: NoteId) -> RepoResult<Vec<Tag>> {
        ensure_exists(&self.conn, EntityKind::Note, note.get())?;
        load_tags_for_note(&self.conn, note)
    }
}

fn insert_tag_links(
    conn: &Connection,
    note: NoteId,
    owner: UserId,
    tag_ids: &[TagId],
) -> RepoResult<()> {
    for tag in distinct_tag_ids(tag_ids) {
        ensure_tag_visible(conn, tag, owner)?;
        conn.execute(
            "INSERT INTO note_tags (note_id, tag_id) VALUES (?1, ?2);",
            params![note.get(), tag.get()],
        )?;
    }
    Ok(())
}

fn note_owner(conn: &Connection, note: NoteId) -> RepoResult<UserId> {
    conn.query_row(
        "SELECT user_id FROM notes WHERE id = ?1;",
        [note.get()],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .map(UserId)
    .ok_or_else(|| RepoError::not_found(EntityKind::Note, note))
}

fn ensure_tag_visible(conn: &Connection, tag: TagId, owner: UserId) -> RepoResult<()> {
    let visible = conn
        .query_row(
            "SELECT 1 FROM tags WHERE id = ?1 AND (user_id IS NULL OR user_id = ?2);",
            params![tag.get(), owner.get()],
            |_| Ok(()),
        )
        .optional()?;
    visible.ok_or_else(|| RepoError::not_found(EntityKind::Tag, tag))
}

fn touch_note(conn: &Connection, note: NoteId) -> RepoResult<()> {
    conn.execute(
        "UPDATE notes SET updated_at = ?2 WHERE id = ?1;",
        params![note.get(), now_epoch_ms()],
    )?;
    Ok(())
}

fn load_note(conn: &Connection, id: NoteId) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.get()])?;
    if let Some(row) = rows.next()? {
        let mut note = parse_note_row(row)?;
        note.tags = load_tags_for_note(conn, id)?;
        return Ok(Some(note));
    }
    Ok(None)
}

fn load_tags_for_note(conn: &Connection, note: NoteId) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.color, t.user_id
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.id ASC;",
    )?;
    let mut rows = stmt.query([note.get()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(Tag {
            id: TagId(row.get("id")?),
            name: row.get("name")?,
            color: row.get("color")?,
            user_id: row.get::<_, Option<i64>>("user_id")?.map(UserId),
        });
    }
    Ok(tags)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    if updated_at < created_at {
        return Err(RepoError::InvalidData(format!(
            "notes.updated_at {updated_at} is earlier than created_at {created_at}"
        )));
    }

    Ok(Note {
        id: NoteId(row.get("id")?),
        title: row.get("title")?,
        content: row.get("content")?,
        subject_id: row.get::<_, Option<i64>>("subject_id")?.map(SubjectId),
        user_id: UserId(row.get("user_id")?),
        created_at,
        updated_at,
        tags: Vec::new(),
    })
}
