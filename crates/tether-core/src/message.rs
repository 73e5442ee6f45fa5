//! Wire message envelope for the control channel.
//!
//! Every frame is one JSON document:
//!
//! ```json
//! {
//!   "session_id": "<uuid>",
//!   "local_timestamp": 1760000000000,
//!   "payload": { "type": "response", "content": { } }
//! }
//! ```
//!
//! Inbound frames keep `content` as raw JSON ([`RawValue`]) so the dispatcher
//! can hand it to the owning session without re-encoding. Outbound frames are
//! built from structured payloads and serialized once by the send pump.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::ids::SessionId;

/// Raw payload content as received off the wire. `None` when the frame
/// carried no `content` field.
pub type RawContent = Option<Box<RawValue>>;

/// The four payload kinds the protocol defines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Instruction,
    Event,
    Response,
    Close,
}

impl PayloadKind {
    /// Parse a wire `type` string. Returns `None` for unknown kinds, which
    /// the dispatcher logs and drops.
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "instruction" => Some(Self::Instruction),
            "event" => Some(Self::Event),
            "response" => Some(Self::Response),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    /// The wire `type` string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instruction => "instruction",
            Self::Event => "event",
            Self::Response => "response",
            Self::Close => "close",
        }
    }
}

/// An inbound frame as decoded by the dispatcher.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    /// Target session.
    pub session_id: SessionId,
    /// Producer-local wall time in milliseconds. Receivers do not rely on
    /// clock sync; kept for logging only.
    #[serde(default)]
    pub local_timestamp: i64,
    /// The typed payload.
    pub payload: InboundPayload,
}

/// Payload of an inbound frame. The `type` is kept as a string so unknown
/// kinds survive decoding and can be reported verbatim.
#[derive(Debug, Deserialize)]
pub struct InboundPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: RawContent,
}

/// Body of an `instruction` payload: `{"instruction": <name>, "message": …}`.
///
/// Inbound instruction routing is reserved; this type exists so the
/// registry contract has a concrete request shape.
#[derive(Debug, Deserialize)]
pub struct InstructionBody {
    pub instruction: String,
    #[serde(default)]
    pub message: RawContent,
}

/// An outbound frame built by a session task.
#[derive(Debug, Serialize)]
pub struct OutboundMessage {
    pub session_id: SessionId,
    pub local_timestamp: i64,
    pub payload: OutboundPayload,
}

/// Structured payload of an outbound frame.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum OutboundPayload {
    Event(EventBody),
    Response(Value),
}

/// Body of an `event` payload: `{"event": <name>, "detail": …}`.
#[derive(Debug, Serialize)]
pub struct EventBody {
    pub event: String,
    pub detail: Value,
}

impl OutboundMessage {
    /// Build a `type: "event"` frame addressed from `session_id`.
    #[must_use]
    pub fn event(session_id: SessionId, event: impl Into<String>, detail: Value) -> Self {
        Self::new(
            session_id,
            OutboundPayload::Event(EventBody {
                event: event.into(),
                detail,
            }),
        )
    }

    /// Build a `type: "response"` frame addressed from `session_id`.
    #[must_use]
    pub fn response(session_id: SessionId, content: Value) -> Self {
        Self::new(session_id, OutboundPayload::Response(content))
    }

    fn new(session_id: SessionId, payload: OutboundPayload) -> Self {
        Self {
            session_id,
            local_timestamp: Utc::now().timestamp_millis(),
            payload,
        }
    }
}
