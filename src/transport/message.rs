use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::sequence::error::SequenceError;
use crate::sequence::operation::{Operation, StepId};

pub const RC_OK: i32 = 0;
pub const RC_NOT_ALLOWED: i32 = -1;
pub const RC_NOT_FOUND: i32 = -2;
pub const RC_INVALID: i32 = -3;
pub const RC_IO: i32 = -4;

/// Message-channel settings shared by producer and sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Build tag; inbound events carrying another version are dropped
    pub version: String,
    pub port: u16,
}

impl TransportConfig {
    pub fn endpoint(&self) -> String {
        format!("ws://localhost:{}", self.port)
    }
}

/// Command response: `{rcode, message, ...extra}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub rcode: i32,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self::with_code(RC_OK, message)
    }

    pub fn with_code(rcode: i32, message: impl Into<String>) -> Self {
        Response {
            rcode,
            message: message.into(),
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.rcode == RC_OK
    }
}

impl From<&SequenceError> for Response {
    fn from(e: &SequenceError) -> Self {
        let rcode = match e {
            SequenceError::Playback(_) => RC_NOT_ALLOWED,
            SequenceError::StepNotFound(_) | SequenceError::NotEditable(_) => RC_NOT_FOUND,
            SequenceError::InvalidRequest(_) | SequenceError::IdsExhausted => RC_INVALID,
            SequenceError::Io { .. }
            | SequenceError::Parse { .. }
            | SequenceError::Serialize(_)
            | SequenceError::Corrupt(_) => RC_IO,
        };
        Response::with_code(rcode, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Outbound refresh commands for the UI view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum UiCommand {
    /// Insert a line after `after` (`None` = top)
    AddLine {
        after: Option<StepId>,
        id: StepId,
        text: String,
    },
    UpdateLine {
        id: StepId,
        text: String,
    },
    RemoveLine {
        id: StepId,
    },
    Clear,
    Alert {
        kind: NoticeKind,
        message: String,
        title: Option<String>,
    },
    Message {
        kind: NoticeKind,
        message: String,
        title: Option<String>,
    },
    PlaybackFinished {
        ok: bool,
        message: String,
    },
}

/// Decode one inbound event message. `Ok(None)` for messages from another
/// build version; the message id is reset for the sequencer to assign.
pub fn decode_inbound(line: &str, version: &str) -> Result<Option<Operation>, serde_json::Error> {
    let raw: Value = serde_json::from_str(line)?;
    let sent = raw.get("version").and_then(Value::as_str).unwrap_or_default();
    if sent != version {
        debug!(sent, expected = version, "dropping event from another producer version");
        return Ok(None);
    }
    let mut op: Operation = serde_json::from_value(raw)?;
    op.id = StepId(0);
    Ok(Some(op))
}

pub fn encode_operation(op: &Operation) -> Result<String, serde_json::Error> {
    serde_json::to_string(op)
}
