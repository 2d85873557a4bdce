//! Frame-in, frame-out request dispatch.
//!
//! # Responsibility
//! - Decode a request frame, route it by channel, encode the reply.
//! - Map every failure into a response frame; dispatch itself never fails.
//!
//! # Invariants
//! - Exactly one response frame per request frame.
//! - Payload decoding failures are `BAD_REQUEST`; service failures keep their
//!   own code.

use super::channel::Channel;
use super::payload::{
    CalendarQuery, CompletionPayload, Credentials, IdPayload, NoteIdPayload, NoteTagPayload,
    OwnerQuery, OwnerSubjectQuery, ProgressPayload, WithId,
};
use super::wire::{ErrorCode, RequestFrame, ResponseFrame, WireError};
use crate::model::coursework::{AssignmentChanges, ExamChanges, NewAssignment, NewExam};
use crate::model::label::{LabelChanges, NewLabel};
use crate::model::note::{NewNote, NoteChanges};
use crate::model::{AssignmentId, ExamId, NoteId, SubjectId, TagId};
use crate::repo::Store;
use crate::service::{PersistenceService, ServiceResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// Routes decoded requests to one [`PersistenceService`].
pub struct Dispatcher<S: Store> {
    service: PersistenceService<S>,
}

impl<S: Store> Dispatcher<S> {
    pub fn new(service: PersistenceService<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &PersistenceService<S> {
        &self.service
    }

    /// Handles one serialized request and returns the serialized response.
    pub fn handle_frame(&mut self, raw: &str) -> String {
        let started = Instant::now();
        let request = match serde_json::from_str::<RequestFrame>(raw) {
            Ok(request) => request,
            Err(err) => {
                log::warn!(
                    "event=ipc_request module=ipc status=error error_code=BAD_REQUEST reason=undecodable_frame"
                );
                let reply = ResponseFrame::failure(
                    recover_request_id(raw),
                    WireError::bad_request(format!("undecodable request frame: {err}")),
                );
                return encode_frame(&reply);
            }
        };

        let response = match Channel::parse(&request.channel) {
            Some(channel) => self.route(channel, request.payload),
            None => Err(WireError::bad_request(format!(
                "unknown channel `{}`",
                request.channel
            ))),
        };

        let duration_ms = started.elapsed().as_millis();
        let reply = match response {
            Ok(data) => {
                log::info!(
                    "event=ipc_request module=ipc channel={} status=ok duration_ms={}",
                    request.channel,
                    duration_ms
                );
                ResponseFrame::success(request.id, data)
            }
            Err(error) => {
                log::warn!(
                    "event=ipc_request module=ipc channel={} status=error error_code={} duration_ms={}",
                    request.channel,
                    error.code.as_str(),
                    duration_ms
                );
                ResponseFrame::failure(request.id, error)
            }
        };
        encode_frame(&reply)
    }

    fn route(&mut self, channel: Channel, payload: Value) -> Result<Value, WireError> {
        let service = &mut self.service;
        match channel {
            Channel::RegisterUser => {
                let creds: Credentials = decode(payload)?;
                encode(service.register(&creds.username, &creds.password))
            }
            Channel::LoginUser => {
                let creds: Credentials = decode(payload)?;
                encode(service.login(&creds.username, &creds.password))
            }

            Channel::GetSubjects => {
                let query: OwnerQuery = decode(payload)?;
                encode(service.list_subjects(query.user_id))
            }
            Channel::AddSubject => encode(service.create_subject(&decode::<NewLabel>(payload)?)),
            Channel::UpdateSubject => {
                let update: WithId<SubjectId, LabelChanges> = decode(payload)?;
                encode(service.update_subject(update.id, &update.fields))
            }
            Channel::DeleteSubject => {
                let target: IdPayload<SubjectId> = decode(payload)?;
                encode(service.delete_subject(target.id))
            }

            Channel::GetTags => {
                let query: OwnerQuery = decode(payload)?;
                encode(service.list_tags(query.user_id))
            }
            Channel::AddTag => encode(service.create_tag(&decode::<NewLabel>(payload)?)),
            Channel::UpdateTag => {
                let update: WithId<TagId, LabelChanges> = decode(payload)?;
                encode(service.update_tag(update.id, &update.fields))
            }
            Channel::DeleteTag => {
                let target: IdPayload<TagId> = decode(payload)?;
                encode(service.delete_tag(target.id))
            }

            Channel::GetNotes => {
                let query: OwnerSubjectQuery = decode(payload)?;
                encode(service.list_notes(query.user_id, query.subject_id))
            }
            Channel::GetNote => {
                let target: IdPayload<NoteId> = decode(payload)?;
                encode(service.get_note(target.id))
            }
            Channel::AddNote => encode(service.create_note(&decode::<NewNote>(payload)?)),
            Channel::UpdateNote => {
                let update: WithId<NoteId, NoteChanges> = decode(payload)?;
                encode(service.update_note(update.id, &update.fields))
            }
            Channel::DeleteNote => {
                let target: IdPayload<NoteId> = decode(payload)?;
                encode(service.delete_note(target.id))
            }
            Channel::AddTagToNote => {
                let link: NoteTagPayload = decode(payload)?;
                encode(service.add_tag_to_note(link.note_id, link.tag_id))
            }
            Channel::RemoveTagFromNote => {
                let link: NoteTagPayload = decode(payload)?;
                encode(service.remove_tag_from_note(link.note_id, link.tag_id))
            }
            Channel::GetTagsForNote => {
                let target: NoteIdPayload = decode(payload)?;
                encode(service.tags_for_note(target.note_id))
            }

            Channel::GetAssignments => {
                let query: OwnerSubjectQuery = decode(payload)?;
                encode(service.list_assignments(query.user_id, query.subject_id))
            }
            Channel::AddAssignment => {
                encode(service.create_assignment(&decode::<NewAssignment>(payload)?))
            }
            Channel::UpdateAssignment => {
                let update: WithId<AssignmentId, AssignmentChanges> = decode(payload)?;
                encode(service.update_assignment(update.id, &update.fields))
            }
            Channel::SetAssignmentCompleted => {
                let toggle: CompletionPayload<AssignmentId> = decode(payload)?;
                encode(service.set_assignment_completed(toggle.id, toggle.is_completed))
            }
            Channel::DeleteAssignment => {
                let target: IdPayload<AssignmentId> = decode(payload)?;
                encode(service.delete_assignment(target.id))
            }

            Channel::GetExams => {
                let query: OwnerSubjectQuery = decode(payload)?;
                encode(service.list_exams(query.user_id, query.subject_id))
            }
            Channel::AddExam => encode(service.create_exam(&decode::<NewExam>(payload)?)),
            Channel::UpdateExam => {
                let update: WithId<ExamId, ExamChanges> = decode(payload)?;
                encode(service.update_exam(update.id, &update.fields))
            }
            Channel::UpdateExamProgress => {
                let update: ProgressPayload<ExamId> = decode(payload)?;
                encode(service.update_exam_progress(update.id, update.progress))
            }
            Channel::DeleteExam => {
                let target: IdPayload<ExamId> = decode(payload)?;
                encode(service.delete_exam(target.id))
            }

            Channel::GetCalendarEvents => {
                let query: CalendarQuery = decode(payload)?;
                encode(service.calendar_events(query.user_id, query.from, query.to))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, WireError> {
    serde_json::from_value(payload)
        .map_err(|err| WireError::bad_request(format!("malformed payload: {err}")))
}

fn encode<T: Serialize>(result: ServiceResult<T>) -> Result<Value, WireError> {
    let value = result.map_err(|err| WireError::from(&err))?;
    serde_json::to_value(value).map_err(|err| WireError {
        code: ErrorCode::StorageFailure,
        message: format!("unencodable response: {err}"),
        entity: None,
        id: None,
    })
}

/// Best effort: an undecodable frame may still carry a readable id.
fn recover_request_id(raw: &str) -> Uuid {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|value| {
            value
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok())
        })
        .unwrap_or_else(Uuid::nil)
}

fn encode_frame(frame: &ResponseFrame) -> String {
    serde_json::to_string(frame).unwrap_or_else(|err| {
        log::error!("event=ipc_encode module=ipc status=error error={err}");
        format!(
            r#"{{"id":"{}","ok":false,"error":{{"code":"STORAGE_FAILURE","message":"response encoding failed"}}}}"#,
            frame.id
        )
    })
}
