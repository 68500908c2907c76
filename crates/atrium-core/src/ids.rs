use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the session/connection a call targets.
///
/// Assigned by the connection layer when a desktop session attaches; carried
/// unchanged through request and response envelopes so the receiving side can
/// route side effects to the right session context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(
    /// Opaque numeric connection identifier.
    pub u32,
);

/// Correlates a response envelope to its request in ICP streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(
    /// Monotonic numeric call identifier, never reused within a connection.
    pub u64,
);

/// Selects which call variant an envelope carries.
///
/// Tags are stable across versions and shared by both ends; a retired tag is
/// never reassigned within a compatible deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallTag(
    /// Stable numeric call-kind identifier.
    pub u32,
);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for CallTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
