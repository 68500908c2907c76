use std::{
    collections::{BTreeSet, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use atrium_core::{ConnectionId, channel_endpoint};
use atrium_icp::CallError;

/// Result of a successful channel open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChannel {
    pub connection_string: String,
    pub instance: u32,
}

#[derive(Debug, Default)]
struct ChannelSlot {
    /// Highest instance ever handed out for this name; instances are
    /// monotonic and never reused within a connection.
    next_instance: u32,
    open: BTreeSet<u32>,
}

/// Per-connection virtual channel bookkeeping.
///
/// Channels are keyed by name plus the dynamic flag, so a static and a
/// dynamic channel may share a name on one connection without colliding.
#[derive(Debug, Default)]
pub struct ChannelStore {
    connections: Mutex<HashMap<ConnectionId, HashMap<(String, bool), ChannelSlot>>>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a channel and assigns its instance number.
    ///
    /// Dynamic channels number repeated opens 1, 2, …; a static channel name
    /// may be open at most once per connection.
    pub fn open(
        &self,
        conn: ConnectionId,
        name: &str,
        dynamic: bool,
    ) -> Result<OpenedChannel, CallError> {
        let mut connections = lock(&self.connections);
        let slot = connections
            .entry(conn)
            .or_default()
            .entry((name.to_string(), dynamic))
            .or_default();

        if !dynamic && !slot.open.is_empty() {
            return Err(CallError::Validation(format!(
                "static channel {name} already open on connection {conn}"
            )));
        }

        slot.next_instance += 1;
        let instance = slot.next_instance;
        slot.open.insert(instance);

        Ok(OpenedChannel {
            connection_string: channel_endpoint(conn, name, instance)
                .to_string_lossy()
                .into_owned(),
            instance,
        })
    }

    /// Tears down one open channel instance; returns false when no such
    /// instance exists.
    pub fn close(&self, conn: ConnectionId, name: &str, instance: u32) -> bool {
        let mut connections = lock(&self.connections);
        let Some(slots) = connections.get_mut(&conn) else {
            return false;
        };

        for dynamic in [true, false] {
            if let Some(slot) = slots.get_mut(&(name.to_string(), dynamic))
                && slot.open.remove(&instance)
            {
                return true;
            }
        }
        false
    }

    /// Drops all channel state for a connection; returns false when the
    /// connection had none.
    pub fn logoff(&self, conn: ConnectionId) -> bool {
        lock(&self.connections).remove(&conn).is_some()
    }

    /// Number of channels currently open on a connection.
    pub fn open_count(&self, conn: ConnectionId) -> usize {
        lock(&self.connections)
            .get(&conn)
            .map(|slots| slots.values().map(|slot| slot.open.len()).sum())
            .unwrap_or(0)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use atrium_core::ConnectionId;
    use atrium_icp::CallError;

    use super::ChannelStore;

    #[test]
    fn dynamic_opens_number_instances_monotonically() {
        let store = ChannelStore::new();
        let conn = ConnectionId(42);

        let first = store.open(conn, "cliprdr", true).expect("first open");
        let second = store.open(conn, "cliprdr", true).expect("second open");

        assert_eq!(first.instance, 1);
        assert_eq!(second.instance, 2);
        assert!(!first.connection_string.is_empty());
        assert_ne!(first.connection_string, second.connection_string);
    }

    #[test]
    fn static_channel_opens_once_per_connection() {
        let store = ChannelStore::new();
        let conn = ConnectionId(1);

        store.open(conn, "rdpdr", false).expect("first open");
        match store.open(conn, "rdpdr", false) {
            Err(CallError::Validation(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }

        // same name on another connection is unaffected
        store.open(ConnectionId(2), "rdpdr", false).expect("other connection");
    }

    #[test]
    fn static_and_dynamic_share_a_name_without_colliding() {
        let store = ChannelStore::new();
        let conn = ConnectionId(3);

        store.open(conn, "rail", false).expect("static open");
        store.open(conn, "rail", true).expect("dynamic open");
        assert_eq!(store.open_count(conn), 2);
    }

    #[test]
    fn close_removes_only_the_named_instance() {
        let store = ChannelStore::new();
        let conn = ConnectionId(7);

        store.open(conn, "cliprdr", true).expect("open 1");
        store.open(conn, "cliprdr", true).expect("open 2");

        assert!(store.close(conn, "cliprdr", 1));
        assert!(!store.close(conn, "cliprdr", 1));
        assert_eq!(store.open_count(conn), 1);
    }

    #[test]
    fn close_unknown_connection_reports_false() {
        let store = ChannelStore::new();
        assert!(!store.close(ConnectionId(9), "cliprdr", 1));
    }

    #[test]
    fn logoff_drops_all_channel_state() {
        let store = ChannelStore::new();
        let conn = ConnectionId(5);

        store.open(conn, "cliprdr", true).expect("open");
        store.open(conn, "rdpsnd", false).expect("open");

        assert!(store.logoff(conn));
        assert_eq!(store.open_count(conn), 0);
        assert!(!store.logoff(conn));

        // a later open starts numbering from scratch
        let reopened = store.open(conn, "cliprdr", true).expect("reopen");
        assert_eq!(reopened.instance, 1);
    }
}
