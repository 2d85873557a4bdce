//! Typed async client over a [`HostHandle`].
//!
//! # Responsibility
//! - Serialize one request per call, await the reply, decode the data.
//! - Rebuild the service failure taxonomy from wire errors unchanged.
//!
//! # Invariants
//! - No caching and no retries; every call crosses the boundary once.
//! - A configured timeout bounds the wait for each single reply.

use super::channel::Channel;
use super::host::{HostError, HostHandle};
use super::payload::{
    CalendarQuery, CompletionPayload, Credentials, IdPayload, NoteIdPayload, NoteTagPayload,
    OwnerQuery, OwnerSubjectQuery, ProgressPayload, WithId,
};
use super::wire::{ErrorCode, RequestFrame, ResponseFrame, WireError};
use crate::model::calendar::CalendarEvent;
use crate::model::coursework::{
    Assignment, AssignmentChanges, Exam, ExamChanges, NewAssignment, NewExam,
};
use crate::model::label::{LabelChanges, NewLabel, Subject, Tag};
use crate::model::note::{NewNote, Note, NoteChanges};
use crate::model::user::UserContext;
use crate::model::{
    AssignmentId, DeleteOutcome, EntityKind, ExamId, NoteId, SubjectId, TagId, UserId,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug)]
pub enum ClientError {
    Conflict(String),
    InvalidCredentials,
    NotFound { entity: EntityKind, id: i64 },
    Validation(String),
    StorageFailure(String),
    /// The host rejected the frame or payload as malformed.
    BadRequest(String),
    /// The host could not be reached or stopped before replying.
    Transport(HostError),
    /// No reply within the configured bound.
    ///
    /// A request still queued when the bound expires is discarded by the
    /// host. One the worker had already started may still commit.
    Timeout(Duration),
    /// Request or response could not be (de)serialized.
    Codec(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::StorageFailure(message) => write!(f, "storage failure: {message}"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Transport(err) => write!(f, "transport failure: {err}"),
            Self::Timeout(limit) => write!(f, "no reply within {} ms", limit.as_millis()),
            Self::Codec(message) => write!(f, "codec failure: {message}"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HostError> for ClientError {
    fn from(value: HostError) -> Self {
        Self::Transport(value)
    }
}

impl From<WireError> for ClientError {
    fn from(value: WireError) -> Self {
        match value.code {
            ErrorCode::Conflict => Self::Conflict(value.message),
            ErrorCode::InvalidCredentials => Self::InvalidCredentials,
            ErrorCode::NotFound => match (value.entity, value.id) {
                (Some(entity), Some(id)) => Self::NotFound { entity, id },
                _ => Self::Codec(format!(
                    "NOT_FOUND reply without entity/id: {}",
                    value.message
                )),
            },
            ErrorCode::Validation => Self::Validation(value.message),
            ErrorCode::StorageFailure => Self::StorageFailure(value.message),
            ErrorCode::BadRequest => Self::BadRequest(value.message),
        }
    }
}

/// Client for one running service host.
#[derive(Clone)]
pub struct ServiceClient {
    handle: HostHandle,
    timeout: Option<Duration>,
}

impl ServiceClient {
    pub fn new(handle: HostHandle) -> Self {
        Self {
            handle,
            timeout: None,
        }
    }

    /// Bounds every wait for a reply; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn request<P, T>(&self, channel: Channel, payload: &P) -> ClientResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload =
            serde_json::to_value(payload).map_err(|err| ClientError::Codec(err.to_string()))?;
        let frame = RequestFrame::new(channel.as_str(), payload);
        let request_id = frame.id;
        let raw = serde_json::to_string(&frame).map_err(|err| ClientError::Codec(err.to_string()))?;

        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.handle.call(raw))
                .await
                .map_err(|_| ClientError::Timeout(limit))??,
            None => self.handle.call(raw).await?,
        };

        let response: ResponseFrame =
            serde_json::from_str(&reply).map_err(|err| ClientError::Codec(err.to_string()))?;
        if response.id != request_id {
            return Err(ClientError::Codec(format!(
                "reply id {} does not match request id {request_id}",
                response.id
            )));
        }

        if !response.ok {
            return Err(match response.error {
                Some(error) => error.into(),
                None => ClientError::Codec("failure reply without error body".to_string()),
            });
        }
        let data = response.data.unwrap_or_default();
        serde_json::from_value(data).map_err(|err| ClientError::Codec(err.to_string()))
    }

    pub async fn register(&self, username: &str, password: &str) -> ClientResult<UserContext> {
        let creds = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.request(Channel::RegisterUser, &creds).await
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<UserContext> {
        let creds = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.request(Channel::LoginUser, &creds).await
    }

    pub async fn get_subjects(&self, owner: UserId) -> ClientResult<Vec<Subject>> {
        self.request(Channel::GetSubjects, &OwnerQuery { user_id: owner })
            .await
    }

    pub async fn add_subject(&self, input: &NewLabel) -> ClientResult<Subject> {
        self.request(Channel::AddSubject, input).await
    }

    pub async fn update_subject(
        &self,
        id: SubjectId,
        changes: &LabelChanges,
    ) -> ClientResult<Subject> {
        let payload = WithId { id, fields: changes };
        self.request(Channel::UpdateSubject, &payload).await
    }

    pub async fn delete_subject(&self, id: SubjectId) -> ClientResult<DeleteOutcome> {
        self.request(Channel::DeleteSubject, &IdPayload { id }).await
    }

    pub async fn get_tags(&self, owner: UserId) -> ClientResult<Vec<Tag>> {
        self.request(Channel::GetTags, &OwnerQuery { user_id: owner })
            .await
    }

    pub async fn add_tag(&self, input: &NewLabel) -> ClientResult<Tag> {
        self.request(Channel::AddTag, input).await
    }

    pub async fn update_tag(&self, id: TagId, changes: &LabelChanges) -> ClientResult<Tag> {
        let payload = WithId { id, fields: changes };
        self.request(Channel::UpdateTag, &payload).await
    }

    pub async fn delete_tag(&self, id: TagId) -> ClientResult<DeleteOutcome> {
        self.request(Channel::DeleteTag, &IdPayload { id }).await
    }

    pub async fn get_notes(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> ClientResult<Vec<Note>> {
        let query = OwnerSubjectQuery {
            user_id: owner,
            subject_id: subject,
        };
        self.request(Channel::GetNotes, &query).await
    }

    pub async fn get_note(&self, id: NoteId) -> ClientResult<Note> {
        self.request(Channel::GetNote, &IdPayload { id }).await
    }

    pub async fn add_note(&self, input: &NewNote) -> ClientResult<Note> {
        self.request(Channel::AddNote, input).await
    }

    pub async fn update_note(&self, id: NoteId, changes: &NoteChanges) -> ClientResult<Note> {
        let payload = WithId { id, fields: changes };
        self.request(Channel::UpdateNote, &payload).await
    }

    pub async fn delete_note(&self, id: NoteId) -> ClientResult<DeleteOutcome> {
        self.request(Channel::DeleteNote, &IdPayload { id }).await
    }

    pub async fn add_tag_to_note(&self, note: NoteId, tag: TagId) -> ClientResult<Note> {
        let link = NoteTagPayload {
            note_id: note,
            tag_id: tag,
        };
        self.request(Channel::AddTagToNote, &link).await
    }

    pub async fn remove_tag_from_note(&self, note: NoteId, tag: TagId) -> ClientResult<Note> {
        let link = NoteTagPayload {
            note_id: note,
            tag_id: tag,
        };
        self.request(Channel::RemoveTagFromNote, &link).await
    }

    pub async fn get_tags_for_note(&self, note: NoteId) -> ClientResult<Vec<Tag>> {
        self.request(Channel::GetTagsForNote, &NoteIdPayload { note_id: note })
            .await
    }

    pub async fn get_assignments(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> ClientResult<Vec<Assignment>> {
        let query = OwnerSubjectQuery {
            user_id: owner,
            subject_id: subject,
        };
        self.request(Channel::GetAssignments, &query).await
    }

    pub async fn add_assignment(&self, input: &NewAssignment) -> ClientResult<Assignment> {
        self.request(Channel::AddAssignment, input).await
    }

    pub async fn update_assignment(
        &self,
        id: AssignmentId,
        changes: &AssignmentChanges,
    ) -> ClientResult<Assignment> {
        let payload = WithId { id, fields: changes };
        self.request(Channel::UpdateAssignment, &payload).await
    }

    pub async fn set_assignment_completed(
        &self,
        id: AssignmentId,
        is_completed: bool,
    ) -> ClientResult<Assignment> {
        let toggle = CompletionPayload { id, is_completed };
        self.request(Channel::SetAssignmentCompleted, &toggle).await
    }

    pub async fn delete_assignment(&self, id: AssignmentId) -> ClientResult<DeleteOutcome> {
        self.request(Channel::DeleteAssignment, &IdPayload { id })
            .await
    }

    pub async fn get_exams(
        &self,
        owner: UserId,
        subject: Option<SubjectId>,
    ) -> ClientResult<Vec<Exam>> {
        let query = OwnerSubjectQuery {
            user_id: owner,
            subject_id: subject,
        };
        self.request(Channel::GetExams, &query).await
    }

    pub async fn add_exam(&self, input: &NewExam) -> ClientResult<Exam> {
        self.request(Channel::AddExam, input).await
    }

    pub async fn update_exam(&self, id: ExamId, changes: &ExamChanges) -> ClientResult<Exam> {
        let payload = WithId { id, fields: changes };
        self.request(Channel::UpdateExam, &payload).await
    }

    pub async fn update_exam_progress(&self, id: ExamId, progress: i64) -> ClientResult<Exam> {
        self.request(Channel::UpdateExamProgress, &ProgressPayload { id, progress })
            .await
    }

    pub async fn delete_exam(&self, id: ExamId) -> ClientResult<DeleteOutcome> {
        self.request(Channel::DeleteExam, &IdPayload { id }).await
    }

    pub async fn get_calendar_events(
        &self,
        owner: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ClientResult<Vec<CalendarEvent>> {
        let query = CalendarQuery {
            user_id: owner,
            from,
            to,
        };
        self.request(Channel::GetCalendarEvents, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::ClientError;
    use crate::ipc::wire::{ErrorCode, WireError};
    use crate::model::EntityKind;

    #[test]
    fn wire_not_found_rebuilds_typed_error() {
        let wire = WireError {
            code: ErrorCode::NotFound,
            message: "tag not found: 3".to_string(),
            entity: Some(EntityKind::Tag),
            id: Some(3),
        };
        assert!(matches!(
            ClientError::from(wire),
            ClientError::NotFound {
                entity: EntityKind::Tag,
                id: 3
            }
        ));
    }

    #[test]
    fn not_found_without_details_is_a_codec_error() {
        let wire = WireError {
            code: ErrorCode::NotFound,
            message: "missing".to_string(),
            entity: None,
            id: None,
        };
        assert!(matches!(ClientError::from(wire), ClientError::Codec(_)));
    }
}
