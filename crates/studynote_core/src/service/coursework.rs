//! Assignment and exam use-cases.
//!
//! Progress is validated here, before the store sees it: values outside
//! `0..=100` fail with `Validation` and are never clamped.

use super::{log_write, PersistenceService, ServiceError, ServiceResult};
use crate::model::coursework::{
    Assignment, AssignmentChanges, Exam, ExamChanges, NewAssignment, NewExam,
};
use crate::model::validation::{optional_text, require_text, Progress, ValidationError};
use crate::model::{AssignmentId, DeleteOutcome, ExamId, SubjectId, UserId};
use crate::repo::Store;
use std::time::Instant;

fn normalize_exam_changes(changes: &ExamChanges) -> Result<ExamChanges, ValidationError> {
    let title = require_text("title", &changes.title)?;
    let progress = Progress::new(changes.progress)?;
    Ok(ExamChanges {
        title,
        description: optional_text(changes.description.as_deref()),
        progress: progress.into(),
        ..changes.clone()
    })
}

impl<S: Store> PersistenceService<S> {
    pub fn list_assignments(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> ServiceResult<Vec<Assignment>> {
        Ok(self.store.list_assignments(owner, subject)?)
    }

    pub fn create_assignment(&mut self, input: &NewAssignment) -> ServiceResult<Assignment> {
        let started = Instant::now();
        let result = require_text("title", &input.title)
            .map_err(ServiceError::from)
            .and_then(|title| {
                let input = NewAssignment {
                    title,
                    description: optional_text(input.description.as_deref()),
                    ..input.clone()
                };
                Ok(self.store.create_assignment(&input)?)
            });
        log_write("assignment_create", "service", started, result)
    }

    pub fn update_assignment(
        &mut self,
        id: AssignmentId,
        changes: &AssignmentChanges,
    ) -> ServiceResult<Assignment> {
        let started = Instant::now();
        let result = require_text("title", &changes.title)
            .map_err(ServiceError::from)
            .and_then(|title| {
                let changes = AssignmentChanges {
                    title,
                    description: optional_text(changes.description.as_deref()),
                    ..changes.clone()
                };
                Ok(self.store.update_assignment(id, &changes)?)
            });
        log_write("assignment_update", "service", started, result)
    }

    pub fn set_assignment_completed(
        &mut self,
        id: AssignmentId,
        is_completed: bool,
    ) -> ServiceResult<Assignment> {
        let started = Instant::now();
        let result = self
            .store
            .set_assignment_completed(id, is_completed)
            .map_err(Into::into);
        log_write("assignment_complete", "service", started, result)
    }

    pub fn delete_assignment(&mut self, id: AssignmentId) -> ServiceResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self
            .store
            .delete_assignment(id)
            .map(DeleteOutcome::from_removed)
            .map_err(Into::into);
        log_write("assignment_delete", "service", started, result)
    }

    pub fn list_exams(&self, owner: UserId, subject: Option<SubjectId>) -> ServiceResult<Vec<Exam>> {
        Ok(self.store.list_exams(owner, subject)?)
    }

    /// New exams start at zero progress.
    pub fn create_exam(&mut self, input: &NewExam) -> ServiceResult<Exam> {
        let started = Instant::now();
        let result = require_text("title", &input.title)
            .map_err(ServiceError::from)
            .and_then(|title| {
                let input = NewExam {
                    title,
                    description: optional_text(input.description.as_deref()),
                    ..input.clone()
                };
                Ok(self.store.create_exam(&input)?)
            });
        log_write("exam_create", "service", started, result)
    }

    pub fn update_exam(&mut self, id: ExamId, changes: &ExamChanges) -> ServiceResult<Exam> {
        let started = Instant::now();
        let result = normalize_exam_changes(changes)
            .map_err(ServiceError::from)
            .and_then(|changes| Ok(self.store.update_exam(id, &changes)?));
        log_write("exam_update", "service", started, result)
    }

    pub fn update_exam_progress(&mut self, id: ExamId, progress: i64) -> ServiceResult<Exam> {
        let started = Instant::now();
        let result = Progress::new(progress)
            .map_err(ServiceError::from)
            .and_then(|progress| Ok(self.store.update_exam_progress(id, progress)?));
        log_write("exam_progress", "service", started, result)
    }

    pub fn delete_exam(&mut self, id: ExamId) -> ServiceResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self
            .store
            .delete_exam(id)
            .map(DeleteOutcome::from_removed)
            .map_err(Into::into);
        log_write("exam_delete", "service", started, result)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::coursework::{ExamChanges, NewAssignment, NewExam};
    use crate::model::validation::ValidationError;
    use crate::model::{EntityKind, ExamId, UserId};
    use crate::repo::memory_store::MemoryStore;
    use crate::service::{PersistenceService, ServiceError};
    use chrono::NaiveDate;

    fn service_with_user() -> (PersistenceService<MemoryStore>, UserId) {
        let mut service = PersistenceService::new(MemoryStore::new());
        let user = service.register("ada", "pw").unwrap();
        (service, user.id)
    }

    fn new_exam(owner: UserId) -> NewExam {
        NewExam {
            title: "Midterm".to_string(),
            description: Some("   ".to_string()),
            exam_date: NaiveDate::from_ymd_opt(2023, 7, 20),
            subject_id: None,
            user_id: owner,
        }
    }

    #[test]
    fn new_assignment_starts_incomplete_and_can_be_completed() {
        let (mut service, owner) = service_with_user();
        let assignment = service
            .create_assignment(&NewAssignment {
                title: "Calculus Homework".to_string(),
                description: Some("ch. 3".to_string()),
                due_date: NaiveDate::from_ymd_opt(2023, 7, 15),
                subject_id: None,
                user_id: owner,
            })
            .unwrap();
        assert!(!assignment.is_completed);

        let done = service
            .set_assignment_completed(assignment.id, true)
            .unwrap();
        assert!(done.is_completed);
    }

    #[test]
    fn new_exam_starts_at_zero_and_blank_description_is_dropped() {
        let (mut service, owner) = service_with_user();
        let exam = service.create_exam(&new_exam(owner)).unwrap();
        assert_eq!(exam.progress.value(), 0);
        assert_eq!(exam.description, None);
    }

    #[test]
    fn out_of_range_progress_is_rejected_without_clamping() {
        let (mut service, owner) = service_with_user();
        let exam = service.create_exam(&new_exam(owner)).unwrap();

        let err = service
            .update_exam(
                exam.id,
                &ExamChanges {
                    title: "Midterm".to_string(),
                    description: None,
                    exam_date: exam.exam_date,
                    progress: 150,
                    subject_id: None,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::ProgressOutOfRange(150))
        ));

        let err = service.update_exam_progress(exam.id, -5).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stored = service.list_exams(owner, None).unwrap();
        assert_eq!(stored[0].progress.value(), 0);
    }

    #[test]
    fn progress_update_on_missing_exam_is_not_found() {
        let (mut service, _) = service_with_user();
        let err = service.update_exam_progress(ExamId(3), 40).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: EntityKind::Exam,
                id: 3
            }
        ));
    }
}
