use std::{
    collections::{HashMap, HashSet},
    io::ErrorKind,
    path::Path,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use atrium_core::{
    CallId, CallTag, ConnectionId, Frame, Outcome, RequestEnvelope, ResponseEnvelope,
};
use serde::Deserialize;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadHalf},
    net::UnixStream,
    sync::oneshot,
    time::timeout,
};

use crate::{
    CallError, InboundRegistry, OutboundCall,
    codec::{decode, encode},
    framing::{read_frame, write_frame},
};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// One end of an ICP connection.
///
/// Owns the write half of the shared stream and a receive loop that
/// demultiplexes incoming frames: responses wake the single matching waiter,
/// requests are dispatched through the inbound registry. Cloning hands out
/// another handle to the same connection.
#[derive(Clone)]
pub struct IcpPeer {
    shared: Arc<PeerShared>,
    call_timeout: Duration,
}

struct Waiter {
    tag: CallTag,
    conn: ConnectionId,
    tx: oneshot::Sender<ResponseEnvelope>,
}

struct PeerShared {
    writer: tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: Mutex<HashMap<CallId, Waiter>>,
    busy: Mutex<HashSet<ConnectionId>>,
    next_call_id: AtomicU64,
    closed: AtomicBool,
}

impl IcpPeer {
    /// Starts a peer over any bidirectional byte stream and spawns its
    /// receive loop.
    pub fn start<S>(stream: S, registry: Arc<InboundRegistry>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let shared = Arc::new(PeerShared {
            writer: tokio::sync::Mutex::new(Box::new(writer)),
            pending: Mutex::new(HashMap::new()),
            busy: Mutex::new(HashSet::new()),
            next_call_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });

        tokio::spawn(receive_loop(Arc::clone(&shared), registry, reader));

        Self {
            shared,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Connects to an ICP Unix socket and starts a peer on it.
    pub async fn connect_unix(
        path: impl AsRef<Path>,
        registry: Arc<InboundRegistry>,
    ) -> Result<Self, CallError> {
        let stream = UnixStream::connect(path).await?;
        Ok(Self::start(stream, registry))
    }

    /// Overrides the default per-call timeout.
    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// True once the underlying connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Sends one call and blocks the caller until its response resolves.
    ///
    /// At most one call may be outstanding per connection identity; a second
    /// concurrent invoke fails with [`CallError::AlreadyPending`]. On success
    /// the call object holds its decoded output fields. Exactly one
    /// resolution happens per invoke: success, a typed failure, or
    /// [`CallError::Timeout`]. A response arriving after timeout or caller
    /// cancellation finds no waiter and is discarded.
    pub async fn invoke<C>(&self, call: &mut C, conn: ConnectionId) -> Result<(), CallError>
    where
        C: OutboundCall + ?Sized,
    {
        let payload = call.encode_request()?;

        if self.is_closed() {
            return Err(CallError::Transport("connection closed".to_string()));
        }

        let tag = call.tag();
        let (claim, rx) = self.claim(tag, conn)?;

        let request = Frame::Request(RequestEnvelope {
            call_id: claim.call_id,
            tag,
            conn,
            payload,
        });
        self.shared.send_frame(&request).await?;

        let response = match timeout(self.call_timeout, rx).await {
            Err(_) => return Err(CallError::Timeout),
            Ok(Err(_)) => return Err(CallError::Transport("connection closed".to_string())),
            Ok(Ok(response)) => response,
        };

        match response.outcome {
            Outcome::Failure { code, message } => {
                Err(CallError::from_failure(code, message, tag, conn))
            }
            Outcome::Success => call.decode_response(&response.payload),
        }
    }

    /// Reserves the connection for one call and parks its response waiter.
    fn claim(
        &self,
        tag: CallTag,
        conn: ConnectionId,
    ) -> Result<(Claim, oneshot::Receiver<ResponseEnvelope>), CallError> {
        if !lock(&self.shared.busy).insert(conn) {
            return Err(CallError::AlreadyPending(conn));
        }

        let call_id = CallId(self.shared.next_call_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        lock(&self.shared.pending).insert(call_id, Waiter { tag, conn, tx });

        Ok((
            Claim {
                shared: Arc::clone(&self.shared),
                call_id,
                conn,
            },
            rx,
        ))
    }
}

impl PeerShared {
    async fn send_frame(&self, frame: &Frame) -> Result<(), CallError> {
        let bytes = encode(frame)?;
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &bytes).await
    }

    /// Marks the connection dead and wakes every in-flight caller by dropping
    /// its waiter; the dropped sender resolves the receiver with an error.
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.pending).clear();
    }
}

/// Releases the pending-map entry and the busy claim on every exit path,
/// including caller cancellation mid-invoke.
struct Claim {
    shared: Arc<PeerShared>,
    call_id: CallId,
    conn: ConnectionId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        lock(&self.shared.pending).remove(&self.call_id);
        lock(&self.shared.busy).remove(&self.conn);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn receive_loop<S>(
    shared: Arc<PeerShared>,
    registry: Arc<InboundRegistry>,
    mut reader: ReadHalf<S>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    loop {
        let bytes = match read_frame(&mut reader).await {
            Ok(bytes) => bytes,
            Err(CallError::Io(err))
                if matches!(
                    err.kind(),
                    ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
                ) =>
            {
                break;
            }
            Err(err) => {
                tracing::debug!(error = %err, "icp receive loop failed");
                break;
            }
        };

        match decode::<Frame>(&bytes) {
            Ok(Frame::Response(envelope)) => resolve_response(&shared, envelope),
            Ok(Frame::Request(envelope)) => {
                let shared = Arc::clone(&shared);
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    serve_request(shared, registry, envelope).await;
                });
            }
            Err(err) => {
                reject_malformed_frame(&shared, &bytes, &err).await;
                break;
            }
        }
    }

    shared.close();
}

/// Wakes the one waiter whose call the envelope resolves. An envelope whose
/// correlation token, tag or connection identity matches no pending call is
/// discarded without touching any caller.
fn resolve_response(shared: &PeerShared, envelope: ResponseEnvelope) {
    let waiter = {
        let mut pending = lock(&shared.pending);
        match pending.get(&envelope.call_id) {
            Some(waiter) if waiter.tag == envelope.tag && waiter.conn == envelope.conn => {
                pending.remove(&envelope.call_id)
            }
            _ => None,
        }
    };

    match waiter {
        // A send failure means the caller already gave up; the claim guard
        // cleans up its own state.
        Some(waiter) => {
            let _ = waiter.tx.send(envelope);
        }
        None => tracing::debug!(
            call_id = %envelope.call_id,
            tag = %envelope.tag,
            conn = %envelope.conn,
            "discarding unmatched icp response"
        ),
    }
}

async fn serve_request(
    shared: Arc<PeerShared>,
    registry: Arc<InboundRegistry>,
    envelope: RequestEnvelope,
) {
    let RequestEnvelope {
        call_id,
        tag,
        conn,
        payload,
    } = envelope;

    let (outcome, payload) = match registry.dispatch(tag, conn, payload).await {
        Ok(payload) => (Outcome::Success, payload),
        Err(err) => {
            tracing::debug!(%tag, %conn, error = %err, "inbound icp call failed");
            (
                Outcome::Failure {
                    code: err.failure_code(),
                    message: err.to_string(),
                },
                Vec::new(),
            )
        }
    };

    let response = Frame::Response(ResponseEnvelope {
        call_id,
        tag,
        conn,
        outcome,
        payload,
    });
    if let Err(err) = shared.send_frame(&response).await {
        tracing::debug!(error = %err, "failed to write icp response");
    }
}

/// Partial view of a frame used to address a failure reply when the full
/// envelope did not parse.
#[derive(Debug, Deserialize)]
struct ReplyKey {
    call_id: CallId,
    tag: CallTag,
    conn: ConnectionId,
}

/// Best-effort `Decode` failure reply for an unparsable frame; the
/// connection is torn down afterwards either way.
async fn reject_malformed_frame(shared: &PeerShared, bytes: &[u8], err: &CallError) {
    tracing::debug!(error = %err, "malformed icp frame");

    let Ok(key) = decode::<ReplyKey>(bytes) else {
        return;
    };

    let response = Frame::Response(ResponseEnvelope {
        call_id: key.call_id,
        tag: key.tag,
        conn: key.conn,
        outcome: Outcome::Failure {
            code: atrium_core::FailureCode::Decode,
            message: "failed to decode request envelope".to_string(),
        },
        payload: Vec::new(),
    });
    let _ = shared.send_frame(&response).await;
}
