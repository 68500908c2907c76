use atrium_core::CallTag;
use atrium_icp::{CallError, InboundCall, OutboundCall, codec};
use serde::{Deserialize, Serialize};

use crate::tags;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LogoffRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LogoffResponse {
    logged_off: bool,
}

/// Logs the targeted session off and releases its channel state.
///
/// The connection identity on the envelope selects the session; the request
/// body carries nothing else.
#[derive(Debug, Default)]
pub struct LogoffSession {
    result: Option<LogoffResponse>,
}

impl LogoffSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session existed and was logged off; `None` until a round
    /// trip succeeds.
    pub fn logged_off(&self) -> Option<bool> {
        self.result.as_ref().map(|result| result.logged_off)
    }

    pub fn set_logged_off(&mut self, logged_off: bool) {
        self.result = Some(LogoffResponse { logged_off });
    }
}

impl OutboundCall for LogoffSession {
    fn tag(&self) -> CallTag {
        tags::LOGOFF_SESSION
    }

    fn encode_request(&self) -> Result<Vec<u8>, CallError> {
        codec::encode(&LogoffRequest {})
    }

    fn decode_response(&mut self, payload: &[u8]) -> Result<(), CallError> {
        self.result = None;
        self.result = Some(codec::decode::<LogoffResponse>(payload)?);
        Ok(())
    }
}

impl InboundCall for LogoffSession {
    const TAG: CallTag = tags::LOGOFF_SESSION;

    fn decode_request(&mut self, payload: &[u8]) -> Result<(), CallError> {
        codec::decode::<LogoffRequest>(payload)?;
        Ok(())
    }

    fn encode_response(&self) -> Result<Vec<u8>, CallError> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| CallError::Encode("logoff outputs not populated".to_string()))?;
        codec::encode(result)
    }
}

#[cfg(test)]
mod tests {
    use atrium_icp::{InboundCall, OutboundCall};

    use super::LogoffSession;

    #[test]
    fn logoff_round_trip_reports_result() {
        let outbound = LogoffSession::new();
        let payload = outbound.encode_request().expect("encode should succeed");

        let mut inbound = LogoffSession::default();
        inbound
            .decode_request(&payload)
            .expect("request decode should succeed");
        inbound.set_logged_off(true);
        let response = inbound.encode_response().expect("response encode should succeed");

        let mut outbound = outbound;
        outbound
            .decode_response(&response)
            .expect("response decode should succeed");
        assert_eq!(outbound.logged_off(), Some(true));
    }
}
