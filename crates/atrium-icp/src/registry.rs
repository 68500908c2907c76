use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use atrium_core::{CallTag, ConnectionId};

use crate::{CallError, InboundCall};

/// Business logic plugged in behind one inbound call variant.
///
/// The handler receives the call object with decoded input fields and fills
/// its output fields; the framework owns all encoding and transport.
#[async_trait]
pub trait CallHandler<C: InboundCall>: Send + Sync + 'static {
    async fn handle(&self, call: &mut C, conn: ConnectionId) -> Result<(), CallError>;
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn dispatch(&self, conn: ConnectionId, payload: Vec<u8>) -> Result<Vec<u8>, CallError>;
}

struct Entry<C, H> {
    handler: H,
    _variant: PhantomData<fn() -> C>,
}

#[async_trait]
impl<C, H> ErasedHandler for Entry<C, H>
where
    C: InboundCall,
    H: CallHandler<C>,
{
    async fn dispatch(&self, conn: ConnectionId, payload: Vec<u8>) -> Result<Vec<u8>, CallError> {
        let mut call = C::default();
        call.decode_request(&payload)?;
        self.handler.handle(&mut call, conn).await?;
        call.encode_response()
    }
}

/// Read-only mapping from call tag to the variant factory and handler.
///
/// Populated once at process start, then shared immutably with every
/// connection's receive loop.
#[derive(Default)]
pub struct InboundRegistry {
    handlers: HashMap<CallTag, Arc<dyn ErasedHandler>>,
}

impl InboundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for the call variant `C` under `C::TAG`.
    ///
    /// Panics if the tag is already taken: tags map one-to-one to variants,
    /// and a double registration is a wiring bug caught at startup.
    pub fn register<C, H>(&mut self, handler: H)
    where
        C: InboundCall,
        H: CallHandler<C>,
    {
        let previous = self.handlers.insert(
            C::TAG,
            Arc::new(Entry {
                handler,
                _variant: PhantomData::<fn() -> C>,
            }),
        );
        assert!(
            previous.is_none(),
            "call tag {} registered twice",
            C::TAG
        );
    }

    /// Decodes, handles and re-encodes one inbound request.
    ///
    /// The handler future runs in its own task so a panicking handler is
    /// reported as a [`CallError::HandlerFault`] instead of taking down the
    /// connection's dispatch loop.
    pub async fn dispatch(
        &self,
        tag: CallTag,
        conn: ConnectionId,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, CallError> {
        let handler = self
            .handlers
            .get(&tag)
            .cloned()
            .ok_or(CallError::UnknownCallType(tag))?;

        match tokio::spawn(async move { handler.dispatch(conn, payload).await }).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                tracing::error!(%tag, %conn, "call handler panicked");
                Err(CallError::HandlerFault("handler panicked".to_string()))
            }
            Err(_) => Err(CallError::HandlerFault(
                "handler task cancelled".to_string(),
            )),
        }
    }

    /// True when a handler is registered for `tag`.
    pub fn contains(&self, tag: CallTag) -> bool {
        self.handlers.contains_key(&tag)
    }
}
