//! Subject and tag use-cases.
//!
//! # Invariants
//! - Names are trimmed and non-empty; colors pass the CSS color check.
//! - Lists include the caller's rows plus the shared defaults.

use super::{log_write, PersistenceService, ServiceError, ServiceResult};
use crate::model::label::{LabelChanges, NewLabel, Subject, Tag};
use crate::model::validation::{normalize_color, require_text, ValidationError};
use crate::model::{DeleteOutcome, SubjectId, TagId, UserId};
use crate::repo::Store;
use std::time::Instant;

fn normalize_new_label(input: &NewLabel) -> Result<NewLabel, ValidationError> {
    Ok(NewLabel {
        name: require_text("name", &input.name)?,
        color: normalize_color(&input.color)?,
        user_id: input.user_id,
    })
}

fn normalize_label_changes(changes: &LabelChanges) -> Result<LabelChanges, ValidationError> {
    Ok(LabelChanges {
        name: require_text("name", &changes.name)?,
        color: normalize_color(&changes.color)?,
    })
}

impl<S: Store> PersistenceService<S> {
    pub fn list_subjects(&self, owner: UserId) -> ServiceResult<Vec<Subject>> {
        Ok(self.store.list_subjects(owner)?)
    }

    pub fn create_subject(&mut self, input: &NewLabel) -> ServiceResult<Subject> {
        let started = Instant::now();
        let result = normalize_new_label(input)
            .map_err(ServiceError::from)
            .and_then(|input| Ok(self.store.create_subject(&input)?));
        log_write("subject_create", "service", started, result)
    }

    pub fn update_subject(
        &mut self,
        id: SubjectId,
        changes: &LabelChanges,
    ) -> ServiceResult<Subject> {
        let started = Instant::now();
        let result = normalize_label_changes(changes)
            .map_err(ServiceError::from)
            .and_then(|changes| Ok(self.store.update_subject(id, &changes)?));
        log_write("subject_update", "service", started, result)
    }

    /// Deleting detaches the subject from its notes and coursework.
    pub fn delete_subject(&mut self, id: SubjectId) -> ServiceResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self
            .store
            .delete_subject(id)
            .map(DeleteOutcome::from_removed)
            .map_err(Into::into);
        log_write("subject_delete", "service", started, result)
    }

    pub fn list_tags(&self, owner: UserId) -> ServiceResult<Vec<Tag>> {
        Ok(self.store.list_tags(owner)?)
    }

    pub fn create_tag(&mut self, input: &NewLabel) -> ServiceResult<Tag> {
        let started = Instant::now();
        let result = normalize_new_label(input)
            .map_err(ServiceError::from)
            .and_then(|input| Ok(self.store.create_tag(&input)?));
        log_write("tag_create", "service", started, result)
    }

    pub fn update_tag(&mut self, id: TagId, changes: &LabelChanges) -> ServiceResult<Tag> {
        let started = Instant::now();
        let result = normalize_label_changes(changes)
            .map_err(ServiceError::from)
            .and_then(|changes| Ok(self.store.update_tag(id, &changes)?));
        log_write("tag_update", "service", started, result)
    }

    /// Deleting a tag also drops every note association it had.
    pub fn delete_tag(&mut self, id: TagId) -> ServiceResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self
            .store
            .delete_tag(id)
            .map(DeleteOutcome::from_removed)
            .map_err(Into::into);
        log_write("tag_delete", "service", started, result)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::label::{LabelChanges, NewLabel};
    use crate::model::{EntityKind, SubjectId, UserId};
    use crate::repo::memory_store::MemoryStore;
    use crate::service::{PersistenceService, ServiceError};

    fn service_with_user() -> (PersistenceService<MemoryStore>, UserId) {
        let mut service = PersistenceService::new(MemoryStore::new());
        let user = service.register("ada", "pw").unwrap();
        (service, user.id)
    }

    #[test]
    fn created_subject_is_listed_with_defaults() {
        let (mut service, owner) = service_with_user();
        let physics = service
            .create_subject(&NewLabel::new(" Physics ", "#00aaff", owner))
            .unwrap();
        assert_eq!(physics.name, "Physics");
        assert_eq!(physics.user_id, Some(owner));

        let subjects = service.list_subjects(owner).unwrap();
        assert_eq!(subjects.len(), 6);
        assert_eq!(subjects.last().unwrap(), &physics);
    }

    #[test]
    fn bad_color_is_a_validation_error() {
        let (mut service, owner) = service_with_user();
        let err = service
            .create_tag(&NewLabel::new("urgent", "not a color!", owner))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn update_missing_subject_is_not_found() {
        let (mut service, _) = service_with_user();
        let err = service
            .update_subject(SubjectId(999), &LabelChanges::new("x", "#fff"))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: EntityKind::Subject,
                id: 999
            }
        ));
    }

    #[test]
    fn delete_reports_whether_a_row_existed() {
        let (mut service, owner) = service_with_user();
        let tag = service
            .create_tag(&NewLabel::new("urgent", "red", owner))
            .unwrap();
        assert!(service.delete_tag(tag.id).unwrap().success);
        assert!(!service.delete_tag(tag.id).unwrap().success);
    }
}
