//! Note use-cases, including single-tag association edits.
//!
//! # Invariants
//! - Titles are trimmed and non-empty; content is stored as given.
//! - Create and update write the note and its full tag set atomically.
//! - Every returned note carries its resolved tags.

use super::{log_write, PersistenceService, ServiceError, ServiceResult};
use crate::model::label::Tag;
use crate::model::note::{NewNote, Note, NoteChanges};
use crate::model::validation::require_text;
use crate::model::{DeleteOutcome, EntityKind, NoteId, SubjectId, TagId, UserId};
use crate::repo::Store;
use std::time::Instant;

impl<S: Store> PersistenceService<S> {
    /// Lists the owner's notes, newest edit first.
    pub fn list_notes(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> ServiceResult<Vec<Note>> {
        Ok(self.store.list_notes(owner, subject)?)
    }

    pub fn get_note(&self, id: NoteId) -> ServiceResult<Note> {
        self.store
            .get_note(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Note, id))
    }

    /// Creates a note and links every distinct tag in `input.tag_ids`.
    pub fn create_note(&mut self, input: &NewNote) -> ServiceResult<Note> {
        let started = Instant::now();
        let result = require_text("title", &input.title)
            .map_err(ServiceError::from)
            .and_then(|title| {
                let input = NewNote {
                    title,
                    ..input.clone()
                };
                Ok(self.store.create_note(&input)?)
            });
        if let Ok(note) = &result {
            log::debug!(
                "event=note_create module=service note_id={} tag_count={}",
                note.id,
                note.tags.len()
            );
        }
        log_write("note_create", "service", started, result)
    }

    /// Replaces title, content, subject and the whole tag set.
    pub fn update_note(&mut self, id: NoteId, changes: &NoteChanges) -> ServiceResult<Note> {
        let started = Instant::now();
        let result = require_text("title", &changes.title)
            .map_err(ServiceError::from)
            .and_then(|title| {
                let changes = NoteChanges {
                    title,
                    ..changes.clone()
                };
                Ok(self.store.update_note(id, &changes)?)
            });
        log_write("note_update", "service", started, result)
    }

    pub fn delete_note(&mut self, id: NoteId) -> ServiceResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self
            .store
            .delete_note(id)
            .map(DeleteOutcome::from_removed)
            .map_err(Into::into);
        log_write("note_delete", "service", started, result)
    }

    /// Links one tag; linking an already linked tag is a no-op.
    pub fn add_tag_to_note(&mut self, note: NoteId, tag: TagId) -> ServiceResult<Note> {
        let started = Instant::now();
        let result = self.store.add_note_tag(note, tag).map_err(Into::into);
        log_write("note_tag_add", "service", started, result)
    }

    pub fn remove_tag_from_note(&mut self, note: NoteId, tag: TagId) -> ServiceResult<Note> {
        let started = Instant::now();
        let result = self.store.remove_note_tag(note, tag).map_err(Into::into);
        log_write("note_tag_remove", "service", started, result)
    }

    pub fn tags_for_note(&self, note: NoteId) -> ServiceResult<Vec<Tag>> {
        Ok(self.store.note_tags(note)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::note::{NewNote, NoteChanges};
    use crate::model::{EntityKind, NoteId, TagId, UserId};
    use crate::repo::memory_store::MemoryStore;
    use crate::service::{PersistenceService, ServiceError};

    fn service_with_user() -> (PersistenceService<MemoryStore>, UserId) {
        let mut service = PersistenceService::new(MemoryStore::new());
        let user = service.register("ada", "pw").unwrap();
        (service, user.id)
    }

    fn new_note(owner: UserId, title: &str, tags: &[i64]) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: "body".to_string(),
            subject_id: None,
            user_id: owner,
            tag_ids: tags.iter().copied().map(TagId).collect(),
        }
    }

    #[test]
    fn create_note_resolves_tags_and_trims_title() {
        let (mut service, owner) = service_with_user();
        let note = service
            .create_note(&new_note(owner, "  Algebra ", &[2, 1, 2]))
            .unwrap();
        assert_eq!(note.title, "Algebra");
        assert_eq!(note.tag_ids(), vec![TagId(1), TagId(2)]);
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn blank_title_is_rejected() {
        let (mut service, owner) = service_with_user();
        let err = service.create_note(&new_note(owner, " ", &[])).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(service.list_notes(owner, None).unwrap().is_empty());
    }

    #[test]
    fn get_missing_note_is_not_found() {
        let (service, _) = service_with_user();
        let err = service.get_note(NoteId(5)).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: EntityKind::Note,
                id: 5
            }
        ));
    }

    #[test]
    fn update_replaces_tag_set() {
        let (mut service, owner) = service_with_user();
        let note = service
            .create_note(&new_note(owner, "Algebra", &[1, 2]))
            .unwrap();
        let updated = service
            .update_note(
                note.id,
                &NoteChanges {
                    title: "Algebra II".to_string(),
                    content: String::new(),
                    subject_id: None,
                    tag_ids: vec![TagId(3)],
                },
            )
            .unwrap();
        assert_eq!(updated.tag_ids(), vec![TagId(3)]);
        assert!(updated.updated_at >= note.updated_at);
    }

    #[test]
    fn single_tag_edits_are_idempotent() {
        let (mut service, owner) = service_with_user();
        let note = service.create_note(&new_note(owner, "Essay", &[])).unwrap();

        service.add_tag_to_note(note.id, TagId(4)).unwrap();
        let twice = service.add_tag_to_note(note.id, TagId(4)).unwrap();
        assert_eq!(twice.tag_ids(), vec![TagId(4)]);

        let removed = service.remove_tag_from_note(note.id, TagId(4)).unwrap();
        assert!(removed.tags.is_empty());
        assert!(service.tags_for_note(note.id).unwrap().is_empty());
    }
}
