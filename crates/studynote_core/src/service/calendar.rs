//! Calendar projection over the owner's dated assignments and exams.

use super::{PersistenceService, ServiceResult};
use crate::model::calendar::CalendarEvent;
use crate::model::validation::require_date_range;
use crate::model::UserId;
use crate::repo::Store;
use chrono::NaiveDate;

impl<S: Store> PersistenceService<S> {
    /// Returns events dated within `[from, to]`, ordered by date, then
    /// assignments before exams, then id. Undated rows are skipped.
    pub fn calendar_events(
        &self,
        owner: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<CalendarEvent>> {
        require_date_range(from, to)?;

        let assignments = self.store.list_assignments(owner, None)?;
        let exams = self.store.list_exams(owner, None)?;

        let mut events = assignments
            .iter()
            .filter_map(CalendarEvent::from_assignment)
            .chain(exams.iter().filter_map(CalendarEvent::from_exam))
            .filter(|event| (from..=to).contains(&event.date))
            .collect::<Vec<_>>();
        events.sort_by_key(CalendarEvent::sort_key);

        log::debug!(
            "event=calendar_query module=service user_id={} event_count={}",
            owner,
            events.len()
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::calendar::CalendarEventKind;
    use crate::model::coursework::{NewAssignment, NewExam};
    use crate::model::UserId;
    use crate::repo::memory_store::MemoryStore;
    use crate::service::{PersistenceService, ServiceError};
    use chrono::NaiveDate;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2023, 7, d)
    }

    fn assignment(owner: UserId, title: &str, due: Option<NaiveDate>) -> NewAssignment {
        NewAssignment {
            title: title.to_string(),
            description: None,
            due_date: due,
            subject_id: None,
            user_id: owner,
        }
    }

    fn exam(owner: UserId, title: &str, date: Option<NaiveDate>) -> NewExam {
        NewExam {
            title: title.to_string(),
            description: None,
            exam_date: date,
            subject_id: None,
            user_id: owner,
        }
    }

    #[test]
    fn events_are_merged_filtered_and_ordered() {
        let mut service = PersistenceService::new(MemoryStore::new());
        let owner = service.register("ada", "pw").unwrap().id;

        service.create_exam(&exam(owner, "Final", day(20))).unwrap();
        service
            .create_assignment(&assignment(owner, "Essay", day(20)))
            .unwrap();
        service
            .create_assignment(&assignment(owner, "Worksheet", day(15)))
            .unwrap();
        service
            .create_assignment(&assignment(owner, "Someday", None))
            .unwrap();
        service
            .create_assignment(&assignment(owner, "Too late", day(31)))
            .unwrap();

        let events = service
            .calendar_events(owner, day(1).unwrap(), day(30).unwrap())
            .unwrap();
        let summary = events
            .iter()
            .map(|event| (event.title.as_str(), event.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("Worksheet", CalendarEventKind::Assignment),
                ("Essay", CalendarEventKind::Assignment),
                ("Final", CalendarEventKind::Exam),
            ]
        );
        assert_eq!(events[2].progress.map(|p| p.value()), Some(0));
        assert_eq!(events[0].is_completed, Some(false));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut service = PersistenceService::new(MemoryStore::new());
        let owner = service.register("ada", "pw").unwrap().id;
        let err = service
            .calendar_events(owner, day(10).unwrap(), day(1).unwrap())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
