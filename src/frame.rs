//! Envelope — the wire message type for desk sessions.
//!
//! ARCHITECTURE
//! ============
//! Every WebSocket message, in both directions, is an `{action, data}`
//! envelope. Inbound envelopes are parsed into a typed [`Command`] so the
//! dispatcher matches on variants instead of action strings. Outbound
//! envelopes are built through the named constructors below, one per action
//! the server emits.
//!
//! DESIGN
//! ======
//! - `data` is free-form JSON on the wire; typing happens per action.
//! - Parse failures never close the connection. They surface as
//!   [`ProtocolError`] and the caller logs and drops the message.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::services::storage::FileRecord;

// =============================================================================
// ACTION NAMES
// =============================================================================

pub const ACTION_INITIALIZE_ME: &str = "initializeMe";
pub const ACTION_JOIN_ROOM: &str = "joinRoom";
pub const ACTION_MOVE_FILE: &str = "moveFile";
pub const ACTION_RENAME_FILE: &str = "renameFile";
pub const ACTION_DELETE_FILE: &str = "deleteFile";

pub const ACTION_ROOM_ACCEPT: &str = "roomAccept";
pub const ACTION_JOIN_ANNOUNCE: &str = "join-announce";
pub const ACTION_INIT_FILES: &str = "initFiles";
pub const ACTION_PROGRESS: &str = "progress";
pub const ACTION_CREATE_FILE: &str = "createFile";

// =============================================================================
// ENVELOPE
// =============================================================================

/// The `{action, data}` message shape shared by both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self { action: action.into(), data }
    }

    #[must_use]
    pub fn room_accept(room: &str) -> Self {
        Self::new(ACTION_ROOM_ACCEPT, Value::String(room.to_owned()))
    }

    #[must_use]
    pub fn join_announce(session_id: Uuid, user_name: Option<&str>) -> Self {
        Self::new(ACTION_JOIN_ANNOUNCE, json!({ "sessionId": session_id, "userName": user_name }))
    }

    #[must_use]
    pub fn init_files(files: &[FileRecord]) -> Self {
        Self::new(ACTION_INIT_FILES, serde_json::to_value(files).unwrap_or_else(|_| json!([])))
    }

    #[must_use]
    pub fn move_file(mv: &MoveFile) -> Self {
        Self::new(ACTION_MOVE_FILE, json!({ "id": mv.id, "position": mv.position }))
    }

    #[must_use]
    pub fn rename_file(file_id: Uuid, new_name: &str) -> Self {
        Self::new(ACTION_RENAME_FILE, json!({ "fileId": file_id, "newName": new_name }))
    }

    #[must_use]
    pub fn delete_file(file_id: Uuid) -> Self {
        Self::new(ACTION_DELETE_FILE, json!({ "fileId": file_id }))
    }

    #[must_use]
    pub fn progress(group_id: &str, bytes_received: u64, bytes_expected: u64) -> Self {
        Self::new(
            ACTION_PROGRESS,
            json!({ "groupId": group_id, "bytesReceived": bytes_received, "bytesExpected": bytes_expected }),
        )
    }

    #[must_use]
    pub fn create_file(group_id: &str, file: &FileRecord) -> Self {
        Self::new(ACTION_CREATE_FILE, json!({ "groupId": group_id, "file": file }))
    }
}

// =============================================================================
// INBOUND COMMANDS
// =============================================================================

/// Canvas position in pixels, as sent by the desk UI. Browsers may report
/// fractional pixels; those are rounded to the nearest whole pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(deserialize_with = "whole_pixel")]
    pub left: i32,
    #[serde(deserialize_with = "whole_pixel")]
    pub top: i32,
}

#[allow(clippy::cast_possible_truncation)]
fn whole_pixel<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?.round();
    if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(D::Error::custom(format!("position {value} is out of range")));
    }
    Ok(value as i32)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoveFile {
    pub id: Uuid,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFile {
    pub file_id: Uuid,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFile {
    pub file_id: Uuid,
}

/// A parsed inbound action with its typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InitializeMe,
    JoinRoom(String),
    MoveFile(MoveFile),
    RenameFile(RenameFile),
    DeleteFile(DeleteFile),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("missing action")]
    MissingAction,
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("invalid payload for {action}: {source}")]
    InvalidPayload {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Loose inbound shape. `action` may be absent or non-string on the wire.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    action: Option<Value>,
    #[serde(default)]
    data: Value,
}

impl Command {
    /// Parse one inbound text message.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] when the text is not JSON, carries no
    /// string action, names an unknown action, or has a malformed payload.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let raw: RawEnvelope = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        let action = match raw.action {
            Some(Value::String(action)) if !action.is_empty() => action,
            _ => return Err(ProtocolError::MissingAction),
        };

        match action.as_str() {
            ACTION_INITIALIZE_ME => Ok(Self::InitializeMe),
            ACTION_JOIN_ROOM => payload(ACTION_JOIN_ROOM, raw.data).map(Self::JoinRoom),
            ACTION_MOVE_FILE => payload(ACTION_MOVE_FILE, raw.data).map(Self::MoveFile),
            ACTION_RENAME_FILE => payload(ACTION_RENAME_FILE, raw.data).map(Self::RenameFile),
            ACTION_DELETE_FILE => payload(ACTION_DELETE_FILE, raw.data).map(Self::DeleteFile),
            _ => Err(ProtocolError::UnknownAction(action)),
        }
    }

    /// Wire name of the action, for logging.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::InitializeMe => ACTION_INITIALIZE_ME,
            Self::JoinRoom(_) => ACTION_JOIN_ROOM,
            Self::MoveFile(_) => ACTION_MOVE_FILE,
            Self::RenameFile(_) => ACTION_RENAME_FILE,
            Self::DeleteFile(_) => ACTION_DELETE_FILE,
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(action: &'static str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload { action, source })
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
