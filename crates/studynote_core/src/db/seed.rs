//! Default subjects and tags inserted on first run.
//!
//! Each table is seeded independently and only while it has no rows at all.

use super::DbResult;
use log::info;
use rusqlite::{params, Connection};

/// `(name, color)` pairs for the ownerless default subjects.
pub const DEFAULT_SUBJECTS: [(&str, &str); 5] = [
    ("Psychology", "#9c27b0"),
    ("Mathematics", "#2196f3"),
    ("Literature", "#673ab7"),
    ("Computer Science", "#ff9800"),
    ("History", "#e91e63"),
];

/// `(name, color)` pairs for the ownerless default tags.
pub const DEFAULT_TAGS: [(&str, &str); 5] = [
    ("important", "#f44336"),
    ("homework", "#ff9800"),
    ("research", "#2196f3"),
    ("lecture", "#4caf50"),
    ("exam prep", "#9c27b0"),
];

pub fn seed_defaults(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;

    let subject_count: i64 = tx.query_row("SELECT COUNT(*) FROM subjects;", [], |row| row.get(0))?;
    if subject_count == 0 {
        for (name, color) in DEFAULT_SUBJECTS {
            tx.execute(
                "INSERT INTO subjects (name, color, user_id) VALUES (?1, ?2, NULL);",
                params![name, color],
            )?;
        }
        info!(
            "event=seed_defaults module=db status=ok table=subjects rows={}",
            DEFAULT_SUBJECTS.len()
        );
    }

    let tag_count: i64 = tx.query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))?;
    if tag_count == 0 {
        for (name, color) in DEFAULT_TAGS {
            tx.execute(
                "INSERT INTO tags (name, color, user_id) VALUES (?1, ?2, NULL);",
                params![name, color],
            )?;
        }
        info!(
            "event=seed_defaults module=db status=ok table=tags rows={}",
            DEFAULT_TAGS.len()
        );
    }

    tx.commit()?;
    Ok(())
}
