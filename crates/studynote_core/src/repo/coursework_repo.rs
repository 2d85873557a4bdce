//! Assignment and exam repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are owner-scoped, optionally subject-scoped, ordered by id.
//! - Dates are stored as ISO `YYYY-MM-DD` text.
//! - Persisted progress outside `0..=100` is reported as invalid data.

use super::sqlite_store::{bool_to_int, ensure_exists, int_to_bool, SqliteStore};
use super::{RepoError, RepoResult};
use crate::model::coursework::{
    Assignment, AssignmentChanges, Exam, ExamChanges, NewAssignment, NewExam,
};
use crate::model::validation::Progress;
use crate::model::{AssignmentId, EntityKind, ExamId, SubjectId, UserId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    is_completed,
    subject_id,
    user_id
FROM assignments";

const EXAM_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    exam_date,
    progress,
    subject_id,
    user_id
FROM exams";

pub trait AssignmentRepository {
    fn list_assignments(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> RepoResult<Vec<Assignment>>;
    fn create_assignment(&mut self, input: &NewAssignment) -> RepoResult<Assignment>;
    fn update_assignment(
        &mut self,
        id: AssignmentId,
        changes: &AssignmentChanges,
    ) -> RepoResult<Assignment>;
    fn set_assignment_completed(
        &mut self,
        id: AssignmentId,
        is_completed: bool,
    ) -> RepoResult<Assignment>;
    /// Returns `false` when no row had this id.
    fn delete_assignment(&mut self, id: AssignmentId) -> RepoResult<bool>;
}

pub trait ExamRepository {
    fn list_exams(&self, owner: UserId, subject: Option<SubjectId>) -> RepoResult<Vec<Exam>>;
    fn create_exam(&mut self, input: &NewExam) -> RepoResult<Exam>;
    /// `changes.progress` must already be within range.
    fn update_exam(&mut self, id: ExamId, changes: &ExamChanges) -> RepoResult<Exam>;
    fn update_exam_progress(&mut self, id: ExamId, progress: Progress) -> RepoResult<Exam>;
    /// Returns `false` when no row had this id.
    fn delete_exam(&mut self, id: ExamId) -> RepoResult<bool>;
}

impl AssignmentRepository for SqliteStore {
    fn list_assignments(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> RepoResult<Vec<Assignment>> {
        let (sql, bind_values) = owner_scoped_sql(ASSIGNMENT_SELECT_SQL, owner, subject);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_assignment_row(row)?);
        }
        Ok(assignments)
    }

    fn create_assignment(&mut self, input: &NewAssignment) -> RepoResult<Assignment> {
        ensure_references(&self.conn, input.user_id, input.subject_id)?;
        self.conn.execute(
            "INSERT INTO assignments (title, description, due_date, is_completed, subject_id, user_id)
             VALUES (?1, ?2, ?3, 0, ?4, ?5);",
            params![
                input.title,
                input.description,
                input.due_date,
                input.subject_id.map(SubjectId::get),
                input.user_id.get(),
            ],
        )?;
        load_assignment(&self.conn, AssignmentId(self.conn.last_insert_rowid()))
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        changes: &AssignmentChanges,
    ) -> RepoResult<Assignment> {
        ensure_exists(&self.conn, EntityKind::Assignment, id.get())?;
        if let Some(subject) = changes.subject_id {
            ensure_exists(&self.conn, EntityKind::Subject, subject.get())?;
        }
        self.conn.execute(
            "UPDATE assignments
             SET
                title = ?2,
                description = ?3,
                due_date = ?4,
                is_completed = ?5,
                subject_id = ?6
             WHERE id = ?1;",
            params![
                id.get(),
                changes.title,
                changes.description,
                changes.due_date,
                bool_to_int(changes.is_completed),
                changes.subject_id.map(SubjectId::get),
            ],
        )?;
        load_assignment(&self.conn, id)
    }

    fn set_assignment_completed(
        &mut self,
        id: AssignmentId,
        is_completed: bool,
    ) -> RepoResult<Assignment> {
        let changed = self.conn.execute(
            "UPDATE assignments SET is_completed = ?2 WHERE id = ?1;",
            params![id.get(), bool_to_int(is_completed)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Assignment, id));
        }
        load_assignment(&self.conn, id)
    }

    fn delete_assignment(&mut self, id: AssignmentId) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM assignments WHERE id = ?1;", [id.get()])?;
        Ok(removed > 0)
    }
}

impl ExamRepository for SqliteStore {
    fn list_exams(&self, owner: UserId, subject: Option<SubjectId>) -> RepoResult<Vec<Exam>> {
        let (sql, bind_values) = owner_scoped_sql(EXAM_SELECT_SQL, owner, subject);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut exams = Vec::new();
        while let Some(row) = rows.next()? {
            exams.push(parse_exam_row(row)?);
        }
        Ok(exams)
    }

    fn create_exam(&mut self, input: &NewExam) -> RepoResult<Exam> {
        ensure_references(&self.conn, input.user_id, input.subject_id)?;
        self.conn.execute(
            "INSERT INTO exams (title, description, exam_date, progress, subject_id, user_id)
             VALUES (?1, ?2, ?3, 0, ?4, ?5);",
            params![
                input.title,
                input.description,
                input.exam_date,
                input.subject_id.map(SubjectId::get),
                input.user_id.get(),
            ],
        )?;
        load_exam(&self.conn, ExamId(self.conn.last_insert_rowid()))
    }

    fn update_exam(&mut self, id: ExamId, changes: &ExamChanges) -> RepoResult<Exam> {
        let progress = Progress::new(changes.progress)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        ensure_exists(&self.conn, EntityKind::Exam, id.get())?;
        if let Some(subject) = changes.subject_id {
            ensure_exists(&self.conn, EntityKind::Subject, subject.get())?;
        }
        self.conn.execute(
            "UPDATE exams
             SET
                title = ?2,
                description = ?3,
                exam_date = ?4,
                progress = ?5,
                subject_id = ?6
             WHERE id = ?1;",
            params![
                id.get(),
                changes.title,
                changes.description,
                changes.exam_date,
                progress.value(),
                changes.subject_id.map(SubjectId::get),
            ],
        )?;
        load_exam(&self.conn, id)
    }

    fn update_exam_progress(&mut self, id: ExamId, progress: Progress) -> RepoResult<Exam> {
        let changed = self.conn.execute(
            "UPDATE exams SET progress = ?2 WHERE id = ?1;",
            params![id.get(), progress.value()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Exam, id));
        }
        load_exam(&self.conn, id)
    }

    fn delete_exam(&mut self, id: ExamId) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM exams WHERE id = ?1;", [id.get()])?;
        Ok(removed > 0)
    }
}

fn owner_scoped_sql(
    select_sql: &str,
    owner: UserId,
    subject: Option<SubjectId>,
) -> (String, Vec<Value>) {
    let mut sql = format!("{select_sql} WHERE user_id = ?");
    let mut bind_values = vec![Value::Integer(owner.get())];
    if let Some(subject) = subject {
        sql.push_str(" AND subject_id = ?");
        bind_values.push(Value::Integer(subject.get()));
    }
    sql.push_str(" ORDER BY id ASC;");
    (sql, bind_values)
}

fn ensure_references(
    conn: &Connection,
    owner: UserId,
    subject: Option<SubjectId>,
) -> RepoResult<()> {
    ensure_exists(conn, EntityKind::User, owner.get())?;
    if let Some(subject) = subject {
        ensure_exists(conn, EntityKind::Subject, subject.get())?;
    }
    Ok(())
}

fn load_assignment(conn: &Connection, id: AssignmentId) -> RepoResult<Assignment> {
    let mut stmt = conn.prepare(&format!("{ASSIGNMENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.get()])?;
    match rows.next()? {
        Some(row) => parse_assignment_row(row),
        None => Err(RepoError::not_found(EntityKind::Assignment, id)),
    }
}

fn load_exam(conn: &Connection, id: ExamId) -> RepoResult<Exam> {
    let mut stmt = conn.prepare(&format!("{EXAM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.get()])?;
    match rows.next()? {
        Some(row) => parse_exam_row(row),
        None => Err(RepoError::not_found(EntityKind::Exam, id)),
    }
}

fn parse_assignment_row(row: &Row<'_>) -> RepoResult<Assignment> {
    Ok(Assignment {
        id: AssignmentId(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        is_completed: int_to_bool(row.get("is_completed")?, "assignments.is_completed")?,
        subject_id: row.get::<_, Option<i64>>("subject_id")?.map(SubjectId),
        user_id: UserId(row.get("user_id")?),
    })
}

fn parse_exam_row(row: &Row<'_>) -> RepoResult<Exam> {
    let raw_progress: i64 = row.get("progress")?;
    let progress = Progress::new(raw_progress).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid progress value `{raw_progress}` in exams.progress"
        ))
    })?;

    Ok(Exam {
        id: ExamId(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        exam_date: row.get("exam_date")?,
        progress,
        subject_id: row.get::<_, Option<i64>>("subject_id")?.map(SubjectId),
        user_id: UserId(row.get("user_id")?),
    })
}
