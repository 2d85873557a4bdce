//! Calendar projection over dated coursework.
//!
//! Events are derived at read time from assignments (`due_date`) and exams
//! (`exam_date`); nothing here is stored.

use super::coursework::{Assignment, Exam};
use super::validation::Progress;
use super::SubjectId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source kind of a calendar event. Assignments sort before exams on the
/// same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEventKind {
    Assignment,
    Exam,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Serialized as `type` to match the calendar view's event shape.
    #[serde(rename = "type")]
    pub kind: CalendarEventKind,
    /// Assignment or exam id, depending on `kind`.
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub subject_id: Option<SubjectId>,
    /// Set for assignments only.
    pub is_completed: Option<bool>,
    /// Set for exams only.
    pub progress: Option<Progress>,
}

impl CalendarEvent {
    /// Returns `None` for undated assignments.
    pub fn from_assignment(assignment: &Assignment) -> Option<Self> {
        Some(Self {
            kind: CalendarEventKind::Assignment,
            id: assignment.id.get(),
            title: assignment.title.clone(),
            date: assignment.due_date?,
            subject_id: assignment.subject_id,
            is_completed: Some(assignment.is_completed),
            progress: None,
        })
    }

    /// Returns `None` for undated exams.
    pub fn from_exam(exam: &Exam) -> Option<Self> {
        Some(Self {
            kind: CalendarEventKind::Exam,
            id: exam.id.get(),
            title: exam.title.clone(),
            date: exam.exam_date?,
            subject_id: exam.subject_id,
            is_completed: None,
            progress: Some(exam.progress),
        })
    }

    pub fn sort_key(&self) -> (NaiveDate, CalendarEventKind, i64) {
        (self.date, self.kind, self.id)
    }
}
