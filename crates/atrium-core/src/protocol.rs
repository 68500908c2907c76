use serde::{Deserialize, Serialize};

use crate::{CallId, CallTag, ConnectionId};

/// Wire protocol version expected by current binaries.
pub const ICP_PROTOCOL_VERSION: u32 = 1;

/// Failure category carried inside a failure outcome.
///
/// The code travels the wire, so every variant is stable; the richer local
/// error type in `atrium-icp` maps onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Request fields were missing or violated a constraint.
    Validation,
    /// Receiving side has no variant registered for the tag.
    UnknownCallType,
    /// Registered handler failed unexpectedly.
    HandlerFault,
    /// Payload bytes did not parse as the expected schema.
    Decode,
    /// No response arrived within the deadline.
    Timeout,
    /// Another call was already outstanding on the connection.
    AlreadyPending,
    /// Connection-level failure.
    Transport,
}

/// Success/failure indicator of a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// Call completed; the payload holds the encoded response fields.
    Success,
    /// Call failed; the payload is empty and must not be decoded.
    Failure {
        /// Failure category.
        code: FailureCode,
        /// Human-readable summary.
        message: String,
    },
}

impl Outcome {
    /// Returns true for the success indicator.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Request envelope: call identity plus the opaque encoded request fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation token assigned by the issuing peer.
    pub call_id: CallId,
    /// Call variant selector.
    pub tag: CallTag,
    /// Target session/connection identity.
    pub conn: ConnectionId,
    /// Encoded request fields; only the matching variant can decode them.
    pub payload: Vec<u8>,
}

/// Response envelope echoing the request identity plus an outcome.
///
/// `call_id`, `tag` and `conn` must all match the originating request;
/// a dispatcher discards any response that matches no pending call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Correlation token echoed from the request envelope.
    pub call_id: CallId,
    /// Call variant selector echoed from the request envelope.
    pub tag: CallTag,
    /// Session/connection identity echoed from the request envelope.
    pub conn: ConnectionId,
    /// Success/failure indicator.
    pub outcome: Outcome,
    /// Encoded response fields; empty on failure.
    pub payload: Vec<u8>,
}

/// One ICP frame. Both peers may issue requests on the same connection, so
/// every frame declares its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// A call request addressed to the receiving peer's registry.
    Request(RequestEnvelope),
    /// A call response addressed to the receiving peer's dispatcher.
    Response(ResponseEnvelope),
}
