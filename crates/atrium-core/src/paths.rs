use std::{env, path::PathBuf};

use crate::ConnectionId;

/// Resolves the broker state directory from environment and platform defaults.
pub fn default_state_dir() -> PathBuf {
    if let Some(override_dir) = env::var_os("ATRIUM_STATE_DIR") {
        return PathBuf::from(override_dir);
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".atrium/state");
    }

    PathBuf::from(".atrium/state")
}

/// Resolves the ICP socket path the daemon binds and clients dial.
pub fn default_socket_path() -> PathBuf {
    if let Some(override_path) = env::var_os("ATRIUM_SOCKET") {
        return PathBuf::from(override_path);
    }

    PathBuf::from("/tmp/atriumd.sock")
}

/// Endpoint path handed back to channel clients after a successful open.
pub fn channel_endpoint(conn: ConnectionId, name: &str, instance: u32) -> PathBuf {
    default_state_dir()
        .join("channels")
        .join(conn.0.to_string())
        .join(format!("{name}.{instance}.sock"))
}
