//! Typed call dispatch over the broker's inter-component protocol.
//!
//! A call variant implements [`OutboundCall`] on the issuing side and
//! [`InboundCall`] on the serving side; the [`IcpPeer`] moves encoded
//! envelopes across a shared connection and correlates responses back to the
//! one caller waiting on them.

mod error;

pub mod call;
pub mod codec;
pub mod framing;
pub mod peer;
pub mod registry;
pub mod server;

pub use call::{InboundCall, OutboundCall};
pub use error::CallError;
pub use peer::IcpPeer;
pub use registry::{CallHandler, InboundRegistry};
pub use server::serve_unix;
