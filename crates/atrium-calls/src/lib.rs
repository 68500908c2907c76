//! Concrete ICP call variants shared by the broker daemon and its clients.

pub mod channel;
pub mod ping;
pub mod session;

pub use channel::{MAX_CHANNEL_NAME, VirtualChannelClose, VirtualChannelOpen};
pub use ping::Ping;
pub use session::LogoffSession;

/// Stable call-tag namespace shared by both ends of the connection.
///
/// Adding a call kind takes a fresh tag; a retired tag is never reused
/// within a compatible deployment.
pub mod tags {
    use atrium_core::CallTag;

    pub const PING: CallTag = CallTag(1);
    pub const VIRTUAL_CHANNEL_OPEN: CallTag = CallTag(20);
    pub const VIRTUAL_CHANNEL_CLOSE: CallTag = CallTag(21);
    pub const LOGOFF_SESSION: CallTag = CallTag(30);
}
