use std::{path::Path, sync::Arc};

use tokio::net::UnixListener;

use crate::{CallError, IcpPeer, InboundRegistry};

/// Accepts ICP connections on a Unix socket and runs a peer per connection.
///
/// Every accepted connection serves inbound calls through the shared
/// registry; its receive loop lives until the connection closes.
pub async fn serve_unix(path: &Path, registry: Arc<InboundRegistry>) -> Result<(), CallError> {
    let listener = UnixListener::bind(path)?;

    loop {
        let (stream, _) = listener.accept().await?;
        tracing::debug!("accepted icp connection");
        let _peer = IcpPeer::start(stream, Arc::clone(&registry));
    }
}
