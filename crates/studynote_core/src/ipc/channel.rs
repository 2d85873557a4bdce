//! Channel names: one per service operation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

macro_rules! channels {
    ($($variant:ident => $name:literal,)+) => {
        /// Operation selector carried in every request frame.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Channel {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl Channel {
            pub const ALL: &'static [Channel] = &[$(Channel::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Returns `None` for names no operation is registered under.
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

channels! {
    RegisterUser => "register-user",
    LoginUser => "login-user",
    GetSubjects => "get-subjects",
    AddSubject => "add-subject",
    UpdateSubject => "update-subject",
    DeleteSubject => "delete-subject",
    GetTags => "get-tags",
    AddTag => "add-tag",
    UpdateTag => "update-tag",
    DeleteTag => "delete-tag",
    GetNotes => "get-notes",
    GetNote => "get-note",
    AddNote => "add-note",
    UpdateNote => "update-note",
    DeleteNote => "delete-note",
    AddTagToNote => "add-tag-to-note",
    RemoveTagFromNote => "remove-tag-from-note",
    GetTagsForNote => "get-tags-for-note",
    GetAssignments => "get-assignments",
    AddAssignment => "add-assignment",
    UpdateAssignment => "update-assignment",
    SetAssignmentCompleted => "set-assignment-completed",
    DeleteAssignment => "delete-assignment",
    GetExams => "get-exams",
    AddExam => "add-exam",
    UpdateExam => "update-exam",
    UpdateExamProgress => "update-exam-progress",
    DeleteExam => "delete-exam",
    GetCalendarEvents => "get-calendar-events",
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
