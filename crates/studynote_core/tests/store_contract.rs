//! Behavior every store must share; each check runs against both backends.

use chrono::NaiveDate;
use std::thread::sleep;
use std::time::Duration;
use studynote_core::model::coursework::{AssignmentChanges, NewAssignment, NewExam};
use studynote_core::model::label::{LabelChanges, NewLabel};
use studynote_core::model::note::{NewNote, NoteChanges};
use studynote_core::model::validation::ValidationError;
use studynote_core::{
    EntityKind, MemoryStore, NoteId, PersistenceService, ServiceError, SqliteStore, Store,
    SubjectId, TagId, UserId,
};

fn sqlite_service() -> PersistenceService<SqliteStore> {
    PersistenceService::new(SqliteStore::open_in_memory().unwrap())
}

fn memory_service() -> PersistenceService<MemoryStore> {
    PersistenceService::new(MemoryStore::new())
}

macro_rules! contract_tests {
    ($($name:ident),+ $(,)?) => {
        mod sqlite_backend {
            $(
                #[test]
                fn $name() {
                    super::$name(super::sqlite_service());
                }
            )+
        }

        mod memory_backend {
            $(
                #[test]
                fn $name() {
                    super::$name(super::memory_service());
                }
            )+
        }
    };
}

contract_tests!(
    created_subject_appears_in_owner_list,
    duplicate_registration_is_a_conflict,
    login_matches_exact_credentials,
    create_note_links_requested_tags,
    update_note_replaces_full_tag_set,
    deleting_tag_removes_its_associations,
    out_of_range_progress_is_rejected,
    deleting_subject_detaches_dependents,
    missing_tag_rolls_back_note_creation,
    update_note_with_missing_tag_rolls_back,
    foreign_private_tag_cannot_be_linked,
    lists_are_scoped_by_owner_and_subject,
    notes_are_listed_newest_edit_first,
    single_tag_links_require_existing_rows,
    updates_and_deletes_report_missing_rows,
    assignment_updates_round_trip_all_fields,
);

fn register(service: &mut PersistenceService<impl Store>, username: &str) -> UserId {
    service.register(username, "pw").unwrap().id
}

fn note_input(owner: UserId, title: &str, subject: Option<SubjectId>, tags: &[i64]) -> NewNote {
    NewNote {
        title: title.to_string(),
        content: format!("{title} body"),
        subject_id: subject,
        user_id: owner,
        tag_ids: tags.iter().copied().map(TagId).collect(),
    }
}

fn date(month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2023, month, day)
}

fn created_subject_appears_in_owner_list(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let created = service
        .create_subject(&NewLabel::new("Physics", "#112233", owner))
        .unwrap();

    let subjects = service.list_subjects(owner).unwrap();
    assert_eq!(subjects.len(), 6);
    assert!(subjects.contains(&created));
    assert!(subjects[..5].iter().all(|subject| subject.user_id.is_none()));
}

fn duplicate_registration_is_a_conflict(mut service: PersistenceService<impl Store>) {
    register(&mut service, "ada");
    let err = service.register("ada", "different").unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

fn login_matches_exact_credentials(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    assert_eq!(service.login("ada", "pw").unwrap().id, owner);
    assert!(matches!(
        service.login("ada", "PW").unwrap_err(),
        ServiceError::InvalidCredentials
    ));
}

fn create_note_links_requested_tags(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let created = service
        .create_note(&note_input(owner, "Limits", Some(SubjectId(2)), &[1, 2]))
        .unwrap();

    let fetched = service.get_note(created.id).unwrap();
    assert_eq!(fetched.tag_ids(), vec![TagId(1), TagId(2)]);
    assert_eq!(fetched.tags[0].name, "important");
    assert_eq!(fetched.subject_id, Some(SubjectId(2)));
    assert_eq!(fetched, created);
}

fn update_note_replaces_full_tag_set(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let note = service
        .create_note(&note_input(owner, "Limits", None, &[1, 2]))
        .unwrap();

    let updated = service
        .update_note(
            note.id,
            &NoteChanges {
                title: "Limits, revised".to_string(),
                content: "new body".to_string(),
                subject_id: None,
                tag_ids: vec![TagId(3)],
            },
        )
        .unwrap();

    assert_eq!(updated.tag_ids(), vec![TagId(3)]);
    assert_eq!(service.tags_for_note(note.id).unwrap().len(), 1);
    assert_eq!(updated.created_at, note.created_at);
    assert!(updated.updated_at >= note.updated_at);
}

fn deleting_tag_removes_its_associations(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let tag = service
        .create_tag(&NewLabel::new("flashcards", "#00ff00", owner))
        .unwrap();
    let note = service
        .create_note(&note_input(owner, "Vocab", None, &[1, tag.id.get()]))
        .unwrap();

    assert!(service.delete_tag(tag.id).unwrap().success);

    assert_eq!(service.get_note(note.id).unwrap().tag_ids(), vec![TagId(1)]);
    assert!(service
        .list_tags(owner)
        .unwrap()
        .iter()
        .all(|listed| listed.id != tag.id));
}

fn out_of_range_progress_is_rejected(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let exam = service
        .create_exam(&NewExam {
            title: "Final".to_string(),
            description: None,
            exam_date: date(7, 20),
            subject_id: None,
            user_id: owner,
        })
        .unwrap();
    assert_eq!(exam.progress.value(), 0);

    let err = service.update_exam_progress(exam.id, 150).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::ProgressOutOfRange(150))
    ));

    let updated = service.update_exam_progress(exam.id, 100).unwrap();
    assert_eq!(updated.progress.value(), 100);
}

fn deleting_subject_detaches_dependents(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let subject = service
        .create_subject(&NewLabel::new("Chemistry", "teal", owner))
        .unwrap();
    let note = service
        .create_note(&note_input(owner, "Bonds", Some(subject.id), &[]))
        .unwrap();
    service
        .create_assignment(&NewAssignment {
            title: "Lab report".to_string(),
            description: None,
            due_date: date(7, 1),
            subject_id: Some(subject.id),
            user_id: owner,
        })
        .unwrap();
    service
        .create_exam(&NewExam {
            title: "Quiz".to_string(),
            description: None,
            exam_date: date(7, 2),
            subject_id: Some(subject.id),
            user_id: owner,
        })
        .unwrap();

    assert!(service.delete_subject(subject.id).unwrap().success);

    assert_eq!(service.get_note(note.id).unwrap().subject_id, None);
    let assignments = service.list_assignments(owner, None).unwrap();
    assert_eq!(assignments[0].subject_id, None);
    let exams = service.list_exams(owner, None).unwrap();
    assert_eq!(exams[0].subject_id, None);
    assert!(service
        .list_notes(owner, Some(subject.id))
        .unwrap()
        .is_empty());
}

fn missing_tag_rolls_back_note_creation(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let err = service
        .create_note(&note_input(owner, "Orphan", None, &[1, 999]))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Tag,
            id: 999
        }
    ));
    assert!(service.list_notes(owner, None).unwrap().is_empty());

    let err = service
        .create_note(&note_input(owner, "Orphan", Some(SubjectId(404)), &[1]))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Subject,
            id: 404
        }
    ));
    assert!(service.list_notes(owner, None).unwrap().is_empty());
}

fn update_note_with_missing_tag_rolls_back(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let note = service
        .create_note(&note_input(owner, "Vectors", None, &[1, 2]))
        .unwrap();

    let err = service
        .update_note(
            note.id,
            &NoteChanges {
                title: "Vectors, rewritten".to_string(),
                content: "lost edit".to_string(),
                subject_id: Some(SubjectId(1)),
                tag_ids: vec![TagId(3), TagId(999)],
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Tag,
            id: 999
        }
    ));

    let stored = service.get_note(note.id).unwrap();
    assert_eq!(stored.title, "Vectors");
    assert_eq!(stored.content, note.content);
    assert_eq!(stored.subject_id, None);
    assert_eq!(stored.tag_ids(), vec![TagId(1), TagId(2)]);
    assert_eq!(stored.updated_at, note.updated_at);
}

fn foreign_private_tag_cannot_be_linked(mut service: PersistenceService<impl Store>) {
    let ada = register(&mut service, "ada");
    let bob = register(&mut service, "bob");
    let private = service
        .create_tag(&NewLabel::new("ada-only", "#abc", ada))
        .unwrap();

    let err = service
        .create_note(&note_input(bob, "Borrowed", None, &[private.id.get()]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: EntityKind::Tag, .. }));

    let note = service
        .create_note(&note_input(bob, "Shared", None, &[1]))
        .unwrap();
    assert!(service.add_tag_to_note(note.id, private.id).is_err());
    assert!(service
        .update_note(
            note.id,
            &NoteChanges {
                title: "Shared".to_string(),
                content: String::new(),
                subject_id: None,
                tag_ids: vec![private.id],
            },
        )
        .is_err());
    assert_eq!(service.get_note(note.id).unwrap().tag_ids(), vec![TagId(1)]);

    let own = service
        .create_note(&note_input(ada, "Mine", None, &[1, private.id.get()]))
        .unwrap();
    assert_eq!(own.tag_ids(), vec![TagId(1), private.id]);
}

fn lists_are_scoped_by_owner_and_subject(mut service: PersistenceService<impl Store>) {
    let ada = register(&mut service, "ada");
    let bob = register(&mut service, "bob");
    service
        .create_note(&note_input(ada, "Math", Some(SubjectId(2)), &[]))
        .unwrap();
    service
        .create_note(&note_input(ada, "History", Some(SubjectId(5)), &[]))
        .unwrap();
    service
        .create_note(&note_input(bob, "Bob's", Some(SubjectId(2)), &[]))
        .unwrap();
    let private = service
        .create_tag(&NewLabel::new("mine", "#abc", ada))
        .unwrap();

    assert_eq!(service.list_notes(ada, None).unwrap().len(), 2);
    let math = service.list_notes(ada, Some(SubjectId(2))).unwrap();
    assert_eq!(math.len(), 1);
    assert_eq!(math[0].title, "Math");
    assert_eq!(service.list_notes(bob, None).unwrap().len(), 1);

    assert!(service.list_tags(ada).unwrap().contains(&private));
    assert!(!service.list_tags(bob).unwrap().contains(&private));
}

fn notes_are_listed_newest_edit_first(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let first = service
        .create_note(&note_input(owner, "First", None, &[]))
        .unwrap();
    sleep(Duration::from_millis(5));
    let second = service
        .create_note(&note_input(owner, "Second", None, &[]))
        .unwrap();

    let ids = |service: &PersistenceService<_>| -> Vec<NoteId> {
        service
            .list_notes(owner, None)
            .unwrap()
            .iter()
            .map(|note| note.id)
            .collect()
    };
    assert_eq!(ids(&service), vec![second.id, first.id]);

    sleep(Duration::from_millis(5));
    service.add_tag_to_note(first.id, TagId(2)).unwrap();
    assert_eq!(ids(&service), vec![first.id, second.id]);
}

fn single_tag_links_require_existing_rows(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let note = service
        .create_note(&note_input(owner, "Essay", None, &[]))
        .unwrap();

    let err = service.add_tag_to_note(note.id, TagId(77)).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Tag,
            id: 77
        }
    ));
    let err = service.add_tag_to_note(NoteId(88), TagId(1)).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Note,
            id: 88
        }
    ));

    service.add_tag_to_note(note.id, TagId(5)).unwrap();
    let again = service.add_tag_to_note(note.id, TagId(5)).unwrap();
    assert_eq!(again.tag_ids(), vec![TagId(5)]);
    let removed = service.remove_tag_from_note(note.id, TagId(5)).unwrap();
    assert!(removed.tags.is_empty());
}

fn updates_and_deletes_report_missing_rows(mut service: PersistenceService<impl Store>) {
    register(&mut service, "ada");

    let err = service
        .update_note(
            NoteId(41),
            &NoteChanges {
                title: "Ghost".to_string(),
                content: String::new(),
                subject_id: Some(SubjectId(404)),
                tag_ids: Vec::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Note,
            id: 41
        }
    ));

    let err = service
        .update_tag(TagId(404), &LabelChanges::new("x", "#fff"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Tag,
            ..
        }
    ));

    assert!(!service.delete_note(NoteId(41)).unwrap().success);
    assert!(!service.delete_subject(SubjectId(404)).unwrap().success);
}

fn assignment_updates_round_trip_all_fields(mut service: PersistenceService<impl Store>) {
    let owner = register(&mut service, "ada");
    let assignment = service
        .create_assignment(&NewAssignment {
            title: "Calculus Homework".to_string(),
            description: Some("Problems 1-10".to_string()),
            due_date: date(7, 15),
            subject_id: Some(SubjectId(2)),
            user_id: owner,
        })
        .unwrap();

    let updated = service
        .update_assignment(
            assignment.id,
            &AssignmentChanges {
                title: "Calculus Homework 2".to_string(),
                description: None,
                due_date: date(7, 22),
                is_completed: true,
                subject_id: None,
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Calculus Homework 2");
    assert_eq!(updated.description, None);
    assert_eq!(updated.due_date, date(7, 22));
    assert!(updated.is_completed);
    assert_eq!(
        service.list_assignments(owner, None).unwrap(),
        vec![updated.clone()]
    );

    assert!(service.delete_assignment(updated.id).unwrap().success);
    assert!(service.list_assignments(owner, None).unwrap().is_empty());
}

#[test]
fn sqlite_store_keeps_data_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studynote.sqlite3");

    let note_id = {
        let mut service = PersistenceService::new(SqliteStore::open(&path).unwrap());
        let owner = register(&mut service, "ada");
        service
            .create_note(&note_input(owner, "Persisted", None, &[4]))
            .unwrap()
            .id
    };

    let service = PersistenceService::new(SqliteStore::open(&path).unwrap());
    let note = service.get_note(note_id).unwrap();
    assert_eq!(note.title, "Persisted");
    assert_eq!(note.tag_ids(), vec![TagId(4)]);
    assert_eq!(service.login("ada", "pw").unwrap().username, "ada");
}
