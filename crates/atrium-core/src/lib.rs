pub mod ids;
pub mod paths;
pub mod protocol;

pub use ids::{CallId, CallTag, ConnectionId};
pub use paths::{channel_endpoint, default_socket_path, default_state_dir};
pub use protocol::{
    Frame, ICP_PROTOCOL_VERSION, FailureCode, Outcome, RequestEnvelope, ResponseEnvelope,
};
