use atrium_core::CallTag;
use atrium_icp::{CallError, InboundCall, OutboundCall, codec};
use serde::{Deserialize, Serialize};

use crate::tags;

/// Longest virtual channel name accepted on the wire, in bytes.
pub const MAX_CHANNEL_NAME: usize = 255;

/// Wire form of a channel open request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOpenRequest {
    /// Channel name, unique per connection and dynamic flag.
    pub name: String,
    /// True for a dynamic channel, false for a static one.
    pub dynamic: bool,
    /// Channel flags, passed through verbatim.
    pub flags: u32,
}

/// Wire form of a successful channel open response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOpenResponse {
    /// Endpoint the channel client dials.
    pub connection_string: String,
    /// Instance number distinguishing repeated opens of one dynamic name.
    pub instance: u32,
}

/// Opens a static or dynamic virtual channel inside an attached session.
#[derive(Debug, Default)]
pub struct VirtualChannelOpen {
    name: String,
    dynamic: bool,
    flags: u32,
    opened: Option<ChannelOpenResponse>,
}

impl VirtualChannelOpen {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Endpoint of the opened channel; `None` until a round trip succeeds.
    pub fn connection_string(&self) -> Option<&str> {
        self.opened
            .as_ref()
            .map(|opened| opened.connection_string.as_str())
    }

    /// Instance number of the opened channel; `None` until a round trip
    /// succeeds.
    pub fn instance(&self) -> Option<u32> {
        self.opened.as_ref().map(|opened| opened.instance)
    }

    /// Records the serving side's result before the response is encoded.
    pub fn set_opened(&mut self, connection_string: String, instance: u32) {
        self.opened = Some(ChannelOpenResponse {
            connection_string,
            instance,
        });
    }

    fn validate(&self) -> Result<(), CallError> {
        if self.name.is_empty() {
            return Err(CallError::Validation(
                "channel name must not be empty".to_string(),
            ));
        }
        if self.name.len() > MAX_CHANNEL_NAME {
            return Err(CallError::Validation(format!(
                "channel name exceeds {MAX_CHANNEL_NAME} bytes"
            )));
        }
        Ok(())
    }
}

impl OutboundCall for VirtualChannelOpen {
    fn tag(&self) -> CallTag {
        tags::VIRTUAL_CHANNEL_OPEN
    }

    fn encode_request(&self) -> Result<Vec<u8>, CallError> {
        self.validate()?;
        codec::encode(&ChannelOpenRequest {
            name: self.name.clone(),
            dynamic: self.dynamic,
            flags: self.flags,
        })
    }

    fn decode_response(&mut self, payload: &[u8]) -> Result<(), CallError> {
        self.opened = None;
        self.opened = Some(codec::decode::<ChannelOpenResponse>(payload)?);
        Ok(())
    }
}

impl InboundCall for VirtualChannelOpen {
    const TAG: CallTag = tags::VIRTUAL_CHANNEL_OPEN;

    fn decode_request(&mut self, payload: &[u8]) -> Result<(), CallError> {
        let request: ChannelOpenRequest = codec::decode(payload)?;
        self.name = request.name;
        self.dynamic = request.dynamic;
        self.flags = request.flags;
        Ok(())
    }

    fn encode_response(&self) -> Result<Vec<u8>, CallError> {
        let opened = self.opened.as_ref().ok_or_else(|| {
            CallError::Encode("channel open outputs not populated".to_string())
        })?;
        codec::encode(opened)
    }
}

/// Wire form of a channel close request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCloseRequest {
    /// Name the channel was opened under.
    pub name: String,
    /// Instance returned by the matching open.
    pub instance: u32,
}

/// Wire form of a channel close response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCloseResponse {
    /// True when the named instance existed and was torn down.
    pub closed: bool,
}

/// Closes a previously opened virtual channel instance.
#[derive(Debug, Default)]
pub struct VirtualChannelClose {
    name: String,
    instance: u32,
    result: Option<ChannelCloseResponse>,
}

impl VirtualChannelClose {
    pub fn new(name: impl Into<String>, instance: u32) -> Self {
        Self {
            name: name.into(),
            instance,
            result: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> u32 {
        self.instance
    }

    /// Whether the daemon tore the channel down; `None` until a round trip
    /// succeeds.
    pub fn closed(&self) -> Option<bool> {
        self.result.as_ref().map(|result| result.closed)
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.result = Some(ChannelCloseResponse { closed });
    }

    fn validate(&self) -> Result<(), CallError> {
        if self.name.is_empty() {
            return Err(CallError::Validation(
                "channel name must not be empty".to_string(),
            ));
        }
        if self.instance == 0 {
            return Err(CallError::Validation(
                "channel instance must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl OutboundCall for VirtualChannelClose {
    fn tag(&self) -> CallTag {
        tags::VIRTUAL_CHANNEL_CLOSE
    }

    fn encode_request(&self) -> Result<Vec<u8>, CallError> {
        self.validate()?;
        codec::encode(&ChannelCloseRequest {
            name: self.name.clone(),
            instance: self.instance,
        })
    }

    fn decode_response(&mut self, payload: &[u8]) -> Result<(), CallError> {
        self.result = None;
        self.result = Some(codec::decode::<ChannelCloseResponse>(payload)?);
        Ok(())
    }
}

impl InboundCall for VirtualChannelClose {
    const TAG: CallTag = tags::VIRTUAL_CHANNEL_CLOSE;

    fn decode_request(&mut self, payload: &[u8]) -> Result<(), CallError> {
        let request: ChannelCloseRequest = codec::decode(payload)?;
        self.name = request.name;
        self.instance = request.instance;
        Ok(())
    }

    fn encode_response(&self) -> Result<Vec<u8>, CallError> {
        let result = self.result.as_ref().ok_or_else(|| {
            CallError::Encode("channel close outputs not populated".to_string())
        })?;
        codec::encode(result)
    }
}
