use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use atrium_core::{CallTag, ConnectionId};
use atrium_icp::{
    CallError, CallHandler, IcpPeer, InboundCall, InboundRegistry, OutboundCall,
    codec::{decode, encode},
    serve_unix,
};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;
use tokio::time::sleep;

const GREET_TAG: CallTag = CallTag(11);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GreetPayload {
    text: String,
}

#[derive(Debug, Default)]
struct Greet {
    text: String,
    reply: Option<String>,
}

impl OutboundCall for Greet {
    fn tag(&self) -> CallTag {
        GREET_TAG
    }

    fn encode_request(&self) -> Result<Vec<u8>, CallError> {
        encode(&GreetPayload {
            text: self.text.clone(),
        })
    }

    fn decode_response(&mut self, payload: &[u8]) -> Result<(), CallError> {
        self.reply = None;
        self.reply = Some(decode::<GreetPayload>(payload)?.text);
        Ok(())
    }
}

impl InboundCall for Greet {
    const TAG: CallTag = GREET_TAG;

    fn decode_request(&mut self, payload: &[u8]) -> Result<(), CallError> {
        self.text = decode::<GreetPayload>(payload)?.text;
        Ok(())
    }

    fn encode_response(&self) -> Result<Vec<u8>, CallError> {
        let reply = self
            .reply
            .as_ref()
            .ok_or_else(|| CallError::Encode("greet reply not populated".into()))?;
        encode(&GreetPayload {
            text: reply.clone(),
        })
    }
}

struct GreetHandler;

#[async_trait]
impl CallHandler<Greet> for GreetHandler {
    async fn handle(&self, call: &mut Greet, conn: ConnectionId) -> Result<(), CallError> {
        call.reply = Some(format!("hello {} on {}", call.text, conn));
        Ok(())
    }
}

#[tokio::test]
async fn client_server_roundtrip_over_unix_socket() {
    let tmp = tempdir().expect("tempdir should be created");
    let socket_path = tmp.path().join("atriumd.sock");

    let mut registry = InboundRegistry::new();
    registry.register::<Greet, _>(GreetHandler);
    let registry = Arc::new(registry);

    let server_socket = socket_path.clone();
    let server = tokio::spawn(async move { serve_unix(&server_socket, registry).await });

    let mut peer = None;
    for _ in 0..200 {
        match IcpPeer::connect_unix(&socket_path, Arc::new(InboundRegistry::new())).await {
            Ok(connected) => {
                peer = Some(connected);
                break;
            }
            Err(CallError::Io(_)) => {
                sleep(Duration::from_millis(10)).await;
            }
            Err(err) => panic!("client should connect: {err}"),
        }
    }
    let peer = peer.expect("client should connect");

    let mut call = Greet {
        text: "broker".to_string(),
        reply: None,
    };
    peer.invoke(&mut call, ConnectionId(42))
        .await
        .expect("invoke should succeed");
    assert_eq!(call.reply.as_deref(), Some("hello broker on 42"));

    server.abort();
}
