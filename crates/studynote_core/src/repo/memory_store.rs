//! In-memory store with the same observable contract as [`SqliteStore`].
//!
//! # Invariants
//! - Ids come from per-table monotonic sequences and are never reused.
//! - Every write validates all references before mutating anything, so a
//!   failed write leaves the store untouched.
//! - Starts with the same ownerless default subjects and tags as a fresh
//!   SQLite database.
//!
//! [`SqliteStore`]: super::sqlite_store::SqliteStore

use super::coursework_repo::{AssignmentRepository, ExamRepository};
use super::label_repo::{SubjectRepository, TagRepository};
use super::note_repo::NoteRepository;
use super::user_repo::UserRepository;
use super::{distinct_tag_ids, now_epoch_ms, RepoError, RepoResult};
use crate::db::seed::{DEFAULT_SUBJECTS, DEFAULT_TAGS};
use crate::model::coursework::{
    Assignment, AssignmentChanges, Exam, ExamChanges, NewAssignment, NewExam,
};
use crate::model::label::{LabelChanges, NewLabel, Subject, Tag};
use crate::model::note::{NewNote, Note, NoteChanges};
use crate::model::user::UserContext;
use crate::model::validation::Progress;
use crate::model::{
    AssignmentId, EntityKind, ExamId, NoteId, SubjectId, TagId, UserId,
};
use std::collections::{BTreeMap, BTreeSet};

struct UserRow {
    username: String,
    password: String,
}

struct NoteRow {
    title: String,
    content: String,
    subject_id: Option<SubjectId>,
    user_id: UserId,
    created_at: i64,
    updated_at: i64,
}

#[derive(Default)]
struct Sequences {
    user: i64,
    subject: i64,
    tag: i64,
    note: i64,
    assignment: i64,
    exam: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Test-oriented store keeping every table in ordered maps.
pub struct MemoryStore {
    users: BTreeMap<UserId, UserRow>,
    subjects: BTreeMap<SubjectId, Subject>,
    tags: BTreeMap<TagId, Tag>,
    notes: BTreeMap<NoteId, NoteRow>,
    note_tags: BTreeSet<(NoteId, TagId)>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    exams: BTreeMap<ExamId, Exam>,
    sequences: Sequences,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a store holding only the default subjects and tags.
    pub fn new() -> Self {
        let mut store = Self {
            users: BTreeMap::new(),
            subjects: BTreeMap::new(),
            tags: BTreeMap::new(),
            notes: BTreeMap::new(),
            note_tags: BTreeSet::new(),
            assignments: BTreeMap::new(),
            exams: BTreeMap::new(),
            sequences: Sequences::default(),
        };

        for (name, color) in DEFAULT_SUBJECTS {
            let id = SubjectId(next(&mut store.sequences.subject));
            store.subjects.insert(
                id,
                Subject {
                    id,
                    name: name.to_string(),
                    color: color.to_string(),
                    user_id: None,
                },
            );
        }
        for (name, color) in DEFAULT_TAGS {
            let id = TagId(next(&mut store.sequences.tag));
            store.tags.insert(
                id,
                Tag {
                    id,
                    name: name.to_string(),
                    color: color.to_string(),
                    user_id: None,
                },
            );
        }

        store
    }

    fn ensure_user(&self, id: UserId) -> RepoResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::not_found(EntityKind::User, id))
        }
    }

    fn ensure_subject(&self, id: Option<SubjectId>) -> RepoResult<()> {
        match id {
            Some(id) if !self.subjects.contains_key(&id) => {
                Err(RepoError::not_found(EntityKind::Subject, id))
            }
            _ => Ok(()),
        }
    }

    fn ensure_tags(&self, owner: UserId, ids: &[TagId]) -> RepoResult<()> {
        let linkable = |id: &TagId| {
            self.tags
                .get(id)
                .is_some_and(|tag| visible_to(owner, tag.user_id))
        };
        match ids.iter().find(|id| !linkable(id)) {
            Some(missing) => Err(RepoError::not_found(EntityKind::Tag, *missing)),
            None => Ok(()),
        }
    }

    fn resolve_note(&self, id: NoteId, row: &NoteRow) -> Note {
        Note {
            id,
            title: row.title.clone(),
            content: row.content.clone(),
            subject_id: row.subject_id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            tags: self.resolve_tags(id),
        }
    }

    fn resolve_tags(&self, note: NoteId) -> Vec<Tag> {
        self.note_tags
            .range((note, TagId(i64::MIN))..=(note, TagId(i64::MAX)))
            .filter_map(|(_, tag)| self.tags.get(tag).cloned())
            .collect()
    }

    fn load_note(&self, id: NoteId) -> RepoResult<Note> {
        self.notes
            .get(&id)
            .map(|row| self.resolve_note(id, row))
            .ok_or_else(|| RepoError::not_found(EntityKind::Note, id))
    }

    fn touch_note(&mut self, id: NoteId) {
        if let Some(row) = self.notes.get_mut(&id) {
            row.updated_at = now_epoch_ms().max(row.created_at);
        }
    }

    fn replace_tag_links(&mut self, note: NoteId, tag_ids: &[TagId]) {
        self.note_tags.retain(|(linked_note, _)| *linked_note != note);
        for tag in distinct_tag_ids(tag_ids) {
            self.note_tags.insert((note, tag));
        }
    }

    fn detach_subject(&mut self, subject: SubjectId) {
        for row in self.notes.values_mut() {
            if row.subject_id == Some(subject) {
                row.subject_id = None;
            }
        }
        for assignment in self.assignments.values_mut() {
            if assignment.subject_id == Some(subject) {
                assignment.subject_id = None;
            }
        }
        for exam in self.exams.values_mut() {
            if exam.subject_id == Some(subject) {
                exam.subject_id = None;
            }
        }
    }
}

fn visible_to(owner: UserId, row_owner: Option<UserId>) -> bool {
    row_owner.is_none() || row_owner == Some(owner)
}

fn in_scope(
    owner: UserId,
    subject: Option<SubjectId>,
    row_owner: UserId,
    row_subject: Option<SubjectId>,
) -> bool {
    row_owner == owner && subject.map_or(true, |wanted| row_subject == Some(wanted))
}

impl UserRepository for MemoryStore {
    fn create_user(&mut self, username: &str, password: &str) -> RepoResult<UserContext> {
        if self.users.values().any(|row| row.username == username) {
            return Err(RepoError::UsernameTaken(username.to_string()));
        }
        let id = UserId(next(&mut self.sequences.user));
        self.users.insert(
            id,
            UserRow {
                username: username.to_string(),
                password: password.to_string(),
            },
        );
        Ok(UserContext {
            id,
            username: username.to_string(),
        })
    }

    fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RepoResult<Option<UserContext>> {
        Ok(self
            .users
            .iter()
            .find(|(_, row)| row.username == username && row.password == password)
            .map(|(id, row)| UserContext {
                id: *id,
                username: row.username.clone(),
            }))
    }
}

impl SubjectRepository for MemoryStore {
    fn list_subjects(&self, owner: UserId) -> RepoResult<Vec<Subject>> {
        Ok(self
            .subjects
            .values()
            .filter(|subject| visible_to(owner, subject.user_id))
            .cloned()
            .collect())
    }

    fn create_subject(&mut self, input: &NewLabel) -> RepoResult<Subject> {
        self.ensure_user(input.user_id)?;
        let subject = Subject {
            id: SubjectId(next(&mut self.sequences.subject)),
            name: input.name.clone(),
            color: input.color.clone(),
            user_id: Some(input.user_id),
        };
        self.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    fn update_subject(&mut self, id: SubjectId, changes: &LabelChanges) -> RepoResult<Subject> {
        let subject = self
            .subjects
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Subject, id))?;
        subject.name = changes.name.clone();
        subject.color = changes.color.clone();
        Ok(subject.clone())
    }

    fn delete_subject(&mut self, id: SubjectId) -> RepoResult<bool> {
        if self.subjects.remove(&id).is_none() {
            return Ok(false);
        }
        self.detach_subject(id);
        Ok(true)
    }
}

impl TagRepository for MemoryStore {
    fn list_tags(&self, owner: UserId) -> RepoResult<Vec<Tag>> {
        Ok(self
            .tags
            .values()
            .filter(|tag| visible_to(owner, tag.user_id))
            .cloned()
            .collect())
    }

    fn create_tag(&mut self, input: &NewLabel) -> RepoResult<Tag> {
        self.ensure_user(input.user_id)?;
        let tag = Tag {
            id: TagId(next(&mut self.sequences.tag)),
            name: input.name.clone(),
            color: input.color.clone(),
            user_id: Some(input.user_id),
        };
        self.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    fn update_tag(&mut self, id: TagId, changes: &LabelChanges) -> RepoResult<Tag> {
        let tag = self
            .tags
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Tag, id))?;
        tag.name = changes.name.clone();
        tag.color = changes.color.clone();
        Ok(tag.clone())
    }

    fn delete_tag(&mut self, id: TagId) -> RepoResult<bool> {
        if self.tags.remove(&id).is_none() {
            return Ok(false);
        }
        self.note_tags.retain(|(_, tag)| *tag != id);
        Ok(true)
    }
}

impl NoteRepository for MemoryStore {
    fn list_notes(&self, owner: UserId, subject: Option<SubjectId>) -> RepoResult<Vec<Note>> {
        let mut notes = self
            .notes
            .iter()
            .filter(|(_, row)| in_scope(owner, subject, row.user_id, row.subject_id))
            .map(|(id, row)| self.resolve_note(*id, row))
            .collect::<Vec<_>>();
        notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        Ok(self.notes.get(&id).map(|row| self.resolve_note(id, row)))
    }

    fn create_note(&mut self, input: &NewNote) -> RepoResult<Note> {
        self.ensure_user(input.user_id)?;
        self.ensure_subject(input.subject_id)?;
        self.ensure_tags(input.user_id, &input.tag_ids)?;

        let id = NoteId(next(&mut self.sequences.note));
        let now = now_epoch_ms();
        self.notes.insert(
            id,
            NoteRow {
                title: input.title.clone(),
                content: input.content.clone(),
                subject_id: input.subject_id,
                user_id: input.user_id,
                created_at: now,
                updated_at: now,
            },
        );
        self.replace_tag_links(id, &input.tag_ids);
        self.load_note(id)
    }

    fn update_note(&mut self, id: NoteId, changes: &NoteChanges) -> RepoResult<Note> {
        let owner = match self.notes.get(&id) {
            Some(row) => row.user_id,
            None => return Err(RepoError::not_found(EntityKind::Note, id)),
        };
        self.ensure_subject(changes.subject_id)?;
        self.ensure_tags(owner, &changes.tag_ids)?;

        if let Some(row) = self.notes.get_mut(&id) {
            row.title = changes.title.clone();
            row.content = changes.content.clone();
            row.subject_id = changes.subject_id;
        }
        self.touch_note(id);
        self.replace_tag_links(id, &changes.tag_ids);
        self.load_note(id)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        if self.notes.remove(&id).is_none() {
            return Ok(false);
        }
        self.note_tags.retain(|(note, _)| *note != id);
        Ok(true)
    }

    fn add_note_tag(&mut self, note: NoteId, tag: TagId) -> RepoResult<Note> {
        let owner = match self.notes.get(&note) {
            Some(row) => row.user_id,
            None => return Err(RepoError::not_found(EntityKind::Note, note)),
        };
        self.ensure_tags(owner, &[tag])?;
        if self.note_tags.insert((note, tag)) {
            self.touch_note(note);
        }
        self.load_note(note)
    }

    fn remove_note_tag(&mut self, note: NoteId, tag: TagId) -> RepoResult<Note> {
        if !self.notes.contains_key(&note) {
            return Err(RepoError::not_found(EntityKind::Note, note));
        }
        if self.note_tags.remove(&(note, tag)) {
            self.touch_note(note);
        }
        self.load_note(note)
    }

    fn note_tags(&self, note: NoteId) -> RepoResult<Vec<Tag>> {
        if !self.notes.contains_key(&note) {
            return Err(RepoError::not_found(EntityKind::Note, note));
        }
        Ok(self.resolve_tags(note))
    }
}

impl AssignmentRepository for MemoryStore {
    fn list_assignments(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> RepoResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .values()
            .filter(|row| in_scope(owner, subject, row.user_id, row.subject_id))
            .cloned()
            .collect())
    }

    fn create_assignment(&mut self, input: &NewAssignment) -> RepoResult<Assignment> {
        self.ensure_user(input.user_id)?;
        self.ensure_subject(input.subject_id)?;
        let assignment = Assignment {
            id: AssignmentId(next(&mut self.sequences.assignment)),
            title: input.title.clone(),
            description: input.description.clone(),
            due_date: input.due_date,
            is_completed: false,
            subject_id: input.subject_id,
            user_id: input.user_id,
        };
        self.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        changes: &AssignmentChanges,
    ) -> RepoResult<Assignment> {
        if !self.assignments.contains_key(&id) {
            return Err(RepoError::not_found(EntityKind::Assignment, id));
        }
        self.ensure_subject(changes.subject_id)?;
        let assignment = self
            .assignments
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Assignment, id))?;
        assignment.title = changes.title.clone();
        assignment.description = changes.description.clone();
        assignment.due_date = changes.due_date;
        assignment.is_completed = changes.is_completed;
        assignment.subject_id = changes.subject_id;
        Ok(assignment.clone())
    }

    fn set_assignment_completed(
        &mut self,
        id: AssignmentId,
        is_completed: bool,
    ) -> RepoResult<Assignment> {
        let assignment = self
            .assignments
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Assignment, id))?;
        assignment.is_completed = is_completed;
        Ok(assignment.clone())
    }

    fn delete_assignment(&mut self, id: AssignmentId) -> RepoResult<bool> {
        Ok(self.assignments.remove(&id).is_some())
    }
}

impl ExamRepository for MemoryStore {
    fn list_exams(&self, owner: UserId, subject: Option<SubjectId>) -> RepoResult<Vec<Exam>> {
        Ok(self
            .exams
            .values()
            .filter(|row| in_scope(owner, subject, row.user_id, row.subject_id))
            .cloned()
            .collect())
    }

    fn create_exam(&mut self, input: &NewExam) -> RepoResult<Exam> {
        self.ensure_user(input.user_id)?;
        self.ensure_subject(input.subject_id)?;
        let exam = Exam {
            id: ExamId(next(&mut self.sequences.exam)),
            title: input.title.clone(),
            description: input.description.clone(),
            exam_date: input.exam_date,
            progress: Progress::ZERO,
            subject_id: input.subject_id,
            user_id: input.user_id,
        };
        self.exams.insert(exam.id, exam.clone());
        Ok(exam)
    }

    fn update_exam(&mut self, id: ExamId, changes: &ExamChanges) -> RepoResult<Exam> {
        let progress = Progress::new(changes.progress)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        if !self.exams.contains_key(&id) {
            return Err(RepoError::not_found(EntityKind::Exam, id));
        }
        self.ensure_subject(changes.subject_id)?;
        let exam = self
            .exams
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Exam, id))?;
        exam.title = changes.title.clone();
        exam.description = changes.description.clone();
        exam.exam_date = changes.exam_date;
        exam.progress = progress;
        exam.subject_id = changes.subject_id;
        Ok(exam.clone())
    }

    fn update_exam_progress(&mut self, id: ExamId, progress: Progress) -> RepoResult<Exam> {
        let exam = self
            .exams
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Exam, id))?;
        exam.progress = progress;
        Ok(exam.clone())
    }

    fn delete_exam(&mut self, id: ExamId) -> RepoResult<bool> {
        Ok(self.exams.remove(&id).is_some())
    }
}
