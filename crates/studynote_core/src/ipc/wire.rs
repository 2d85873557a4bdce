//! JSON frames exchanged between the service client and the service host.
//!
//! # Invariants
//! - A response always echoes the id of the request it answers; frames that
//!   cannot be decoded far enough to read an id are answered with the nil id.
//! - `ok=true` frames carry `data`; `ok=false` frames carry `error`.

use crate::model::EntityKind;
use crate::service::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// `{ "id": "<uuid>", "channel": "<name>", "payload": <json> }`
///
/// `channel` stays a raw string so unknown names still decode and can be
/// answered with `BAD_REQUEST` under the caller's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: Uuid,
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

impl RequestFrame {
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Conflict,
    InvalidCredentials,
    NotFound,
    Validation,
    StorageFailure,
    /// Undecodable frame, unknown channel or malformed payload.
    BadRequest,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::BadRequest => "BAD_REQUEST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub code: ErrorCode,
    pub message: String,
    /// Set for `NOT_FOUND` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKind>,
    /// Set for `NOT_FOUND` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl WireError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: message.into(),
            entity: None,
            id: None,
        }
    }
}

impl From<&ServiceError> for WireError {
    fn from(err: &ServiceError) -> Self {
        let code = match err {
            ServiceError::Conflict(_) => ErrorCode::Conflict,
            ServiceError::InvalidCredentials => ErrorCode::InvalidCredentials,
            ServiceError::NotFound { .. } => ErrorCode::NotFound,
            ServiceError::Validation(_) => ErrorCode::Validation,
            ServiceError::StorageFailure(_) => ErrorCode::StorageFailure,
        };
        let (entity, id) = match err {
            ServiceError::NotFound { entity, id } => (Some(*entity), Some(*id)),
            _ => (None, None),
        };
        Self {
            code,
            message: err.to_string(),
            entity,
            id,
        }
    }
}

/// `{ "id", "ok": true, "data" }` or `{ "id", "ok": false, "error" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: Uuid,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl ResponseFrame {
    pub fn success(id: Uuid, data: Value) -> Self {
        Self {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: Uuid, error: WireError) -> Self {
        Self {
            id,
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}
