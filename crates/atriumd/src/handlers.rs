use std::sync::Arc;

use async_trait::async_trait;
use atrium_calls::{LogoffSession, Ping, VirtualChannelClose, VirtualChannelOpen};
use atrium_core::ConnectionId;
use atrium_icp::{CallError, CallHandler, InboundRegistry};
use tracing::info;

use crate::state::ChannelStore;

/// Wires every supported call variant to its handler over the shared store.
pub fn build_registry(store: Arc<ChannelStore>) -> InboundRegistry {
    let mut registry = InboundRegistry::new();
    registry.register::<Ping, _>(PingHandler);
    registry.register::<VirtualChannelOpen, _>(OpenHandler {
        store: Arc::clone(&store),
    });
    registry.register::<VirtualChannelClose, _>(CloseHandler {
        store: Arc::clone(&store),
    });
    registry.register::<LogoffSession, _>(LogoffHandler { store });
    registry
}

struct PingHandler;

#[async_trait]
impl CallHandler<Ping> for PingHandler {
    async fn handle(&self, _call: &mut Ping, _conn: ConnectionId) -> Result<(), CallError> {
        Ok(())
    }
}

struct OpenHandler {
    store: Arc<ChannelStore>,
}

#[async_trait]
impl CallHandler<VirtualChannelOpen> for OpenHandler {
    async fn handle(
        &self,
        call: &mut VirtualChannelOpen,
        conn: ConnectionId,
    ) -> Result<(), CallError> {
        let opened = self.store.open(conn, call.name(), call.dynamic())?;
        info!(
            %conn,
            name = call.name(),
            dynamic = call.dynamic(),
            flags = call.flags(),
            instance = opened.instance,
            "opened virtual channel"
        );
        call.set_opened(opened.connection_string, opened.instance);
        Ok(())
    }
}

struct CloseHandler {
    store: Arc<ChannelStore>,
}

#[async_trait]
impl CallHandler<VirtualChannelClose> for CloseHandler {
    async fn handle(
        &self,
        call: &mut VirtualChannelClose,
        conn: ConnectionId,
    ) -> Result<(), CallError> {
        let closed = self.store.close(conn, call.name(), call.instance());
        info!(%conn, name = call.name(), instance = call.instance(), closed, "closed virtual channel");
        call.set_closed(closed);
        Ok(())
    }
}

struct LogoffHandler {
    store: Arc<ChannelStore>,
}

#[async_trait]
impl CallHandler<LogoffSession> for LogoffHandler {
    async fn handle(
        &self,
        call: &mut LogoffSession,
        conn: ConnectionId,
    ) -> Result<(), CallError> {
        let logged_off = self.store.logoff(conn);
        info!(%conn, logged_off, "logged session off");
        call.set_logged_off(logged_off);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use atrium_calls::{VirtualChannelOpen, tags};
    use atrium_core::{CallTag, ConnectionId};
    use atrium_icp::{CallError, InboundCall, OutboundCall};

    use super::build_registry;
    use crate::state::ChannelStore;

    #[tokio::test]
    async fn open_cliprdr_twice_yields_instances_one_and_two() {
        let registry = build_registry(Arc::new(ChannelStore::new()));
        let conn = ConnectionId(42);

        for expected_instance in 1_u32..=2 {
            let request = VirtualChannelOpen::new("cliprdr")
                .with_dynamic(true)
                .with_flags(0)
                .encode_request()
                .expect("encode request");

            let response = registry
                .dispatch(tags::VIRTUAL_CHANNEL_OPEN, conn, request)
                .await
                .expect("dispatch should succeed");

            let mut call = VirtualChannelOpen::new("cliprdr").with_dynamic(true);
            call.decode_response(&response).expect("decode response");
            assert!(!call.connection_string().expect("connection string").is_empty());
            assert_eq!(call.instance(), Some(expected_instance));
        }
    }

    #[tokio::test]
    async fn unknown_tag_is_reported_without_killing_the_registry() {
        let registry = build_registry(Arc::new(ChannelStore::new()));
        let conn = ConnectionId(1);

        match registry.dispatch(CallTag(9999), conn, Vec::new()).await {
            Err(CallError::UnknownCallType(tag)) => assert_eq!(tag, CallTag(9999)),
            other => panic!("unexpected result: {other:?}"),
        }

        // the registry keeps serving known tags afterwards
        let request = VirtualChannelOpen::new("rail")
            .with_dynamic(true)
            .encode_request()
            .expect("encode request");
        registry
            .dispatch(tags::VIRTUAL_CHANNEL_OPEN, conn, request)
            .await
            .expect("dispatch should still succeed");
    }

    #[tokio::test]
    async fn malformed_payload_fails_with_decode_error() {
        let registry = build_registry(Arc::new(ChannelStore::new()));

        let result = registry
            .dispatch(tags::VIRTUAL_CHANNEL_OPEN, ConnectionId(1), vec![0xff, 0x00])
            .await;

        match result {
            Err(CallError::Decode(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn registry_covers_every_published_tag() {
        let registry = build_registry(Arc::new(ChannelStore::new()));

        for tag in [
            tags::PING,
            tags::VIRTUAL_CHANNEL_OPEN,
            tags::VIRTUAL_CHANNEL_CLOSE,
            tags::LOGOFF_SESSION,
        ] {
            assert!(registry.contains(tag), "missing handler for tag {tag}");
        }
    }

    #[test]
    fn default_open_call_decodes_requests() {
        let payload = VirtualChannelOpen::new("echo")
            .with_dynamic(true)
            .with_flags(3)
            .encode_request()
            .expect("encode request");

        let mut call = VirtualChannelOpen::default();
        call.decode_request(&payload).expect("decode request");
        assert_eq!(call.name(), "echo");
        assert_eq!(call.flags(), 3);
    }
}
