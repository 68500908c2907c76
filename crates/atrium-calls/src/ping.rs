use atrium_core::CallTag;
use atrium_icp::{CallError, InboundCall, OutboundCall, codec};
use serde::{Deserialize, Serialize};

use crate::tags;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PingRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PingResponse {}

/// Liveness probe; carries no fields in either direction.
#[derive(Debug, Default)]
pub struct Ping;

impl OutboundCall for Ping {
    fn tag(&self) -> CallTag {
        tags::PING
    }

    fn encode_request(&self) -> Result<Vec<u8>, CallError> {
        codec::encode(&PingRequest {})
    }

    fn decode_response(&mut self, payload: &[u8]) -> Result<(), CallError> {
        codec::decode::<PingResponse>(payload)?;
        Ok(())
    }
}

impl InboundCall for Ping {
    const TAG: CallTag = tags::PING;

    fn decode_request(&mut self, payload: &[u8]) -> Result<(), CallError> {
        codec::decode::<PingRequest>(payload)?;
        Ok(())
    }

    fn encode_response(&self) -> Result<Vec<u8>, CallError> {
        codec::encode(&PingResponse {})
    }
}
