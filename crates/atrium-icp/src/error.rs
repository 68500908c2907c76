use atrium_core::{CallTag, ConnectionId, FailureCode};
use thiserror::Error;

/// Failures surfaced by ICP call dispatch.
#[derive(Debug, Error)]
pub enum CallError {
    /// Input fields were missing or violated a constraint; caught before any I/O.
    #[error("validation failed: {0}")]
    Validation(String),
    /// No call variant is registered for the tag on the receiving side.
    #[error("unknown call type {0}")]
    UnknownCallType(CallTag),
    /// A registered handler failed in a way it did not report itself.
    #[error("handler fault: {0}")]
    HandlerFault(String),
    /// Payload bytes did not parse as the expected schema.
    #[error("failed to decode payload: {0}")]
    Decode(String),
    /// Request or response fields failed to serialize.
    #[error("failed to encode payload: {0}")]
    Encode(String),
    /// No response arrived within the call deadline.
    #[error("call timed out")]
    Timeout,
    /// A call was already outstanding on the connection identity.
    #[error("call already pending on connection {0}")]
    AlreadyPending(ConnectionId),
    /// Connection-level failure; surfaced, never retried here.
    #[error("transport error: {0}")]
    Transport(String),
    /// Underlying socket I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Frame size exceeded the maximum allowed payload.
    #[error("frame too large: {size} > {max}")]
    FrameTooLarge { size: u32, max: u32 },
}

impl CallError {
    /// Wire code used when this error crosses the connection in a failure
    /// envelope. `Encode` and `FrameTooLarge` never originate on the remote
    /// side of a call, so they fold into the nearest wire category.
    pub fn failure_code(&self) -> FailureCode {
        match self {
            CallError::Validation(_) => FailureCode::Validation,
            CallError::UnknownCallType(_) => FailureCode::UnknownCallType,
            CallError::HandlerFault(_) | CallError::Encode(_) => FailureCode::HandlerFault,
            CallError::Decode(_) => FailureCode::Decode,
            CallError::Timeout => FailureCode::Timeout,
            CallError::AlreadyPending(_) => FailureCode::AlreadyPending,
            CallError::Transport(_) | CallError::Io(_) | CallError::FrameTooLarge { .. } => {
                FailureCode::Transport
            }
        }
    }

    /// Reconstructs the caller-facing error from a failure envelope.
    pub fn from_failure(
        code: FailureCode,
        message: String,
        tag: CallTag,
        conn: ConnectionId,
    ) -> Self {
        match code {
            FailureCode::Validation => CallError::Validation(message),
            FailureCode::UnknownCallType => CallError::UnknownCallType(tag),
            FailureCode::HandlerFault => CallError::HandlerFault(message),
            FailureCode::Decode => CallError::Decode(message),
            FailureCode::Timeout => CallError::Timeout,
            FailureCode::AlreadyPending => CallError::AlreadyPending(conn),
            FailureCode::Transport => CallError::Transport(message),
        }
    }
}
