use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use atrium_calls::{LogoffSession, Ping, VirtualChannelClose, VirtualChannelOpen};
use atrium_core::{ConnectionId, default_socket_path};
use atrium_icp::{CallError, IcpPeer, InboundRegistry};
use clap::{Parser, Subcommand};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "atrium", about = "Atrium session broker CLI")]
struct Cli {
    /// ICP socket to dial; defaults to $ATRIUM_SOCKET or /tmp/atriumd.sock.
    #[arg(long)]
    socket: Option<PathBuf>,
    /// Per-call timeout in milliseconds.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probes daemon liveness.
    Ping {
        /// Target connection identity.
        connection: u32,
    },
    /// Opens a virtual channel inside an attached session.
    OpenChannel {
        /// Target connection identity.
        connection: u32,
        /// Channel name, e.g. cliprdr.
        name: String,
        /// Open a dynamic channel instead of a static one.
        #[arg(long)]
        dynamic: bool,
        /// Channel flags bitmask, passed through verbatim.
        #[arg(long, default_value_t = 0)]
        flags: u32,
    },
    /// Closes a previously opened virtual channel instance.
    CloseChannel {
        /// Target connection identity.
        connection: u32,
        /// Channel name.
        name: String,
        /// Instance returned by the matching open.
        instance: u32,
    },
    /// Logs a session off and releases its channels.
    Logoff {
        /// Target connection identity.
        connection: u32,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("channel open succeeded but returned no outputs")]
    MissingOutputs,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let socket = cli.socket.clone().unwrap_or_else(default_socket_path);
    let peer = IcpPeer::connect_unix(&socket, Arc::new(InboundRegistry::new()))
        .await?
        .with_timeout(Duration::from_millis(cli.timeout_ms));

    match cli.command {
        Command::Ping { connection } => {
            let mut call = Ping;
            peer.invoke(&mut call, ConnectionId(connection)).await?;
            println!("pong");
            Ok(())
        }
        Command::OpenChannel {
            connection,
            name,
            dynamic,
            flags,
        } => {
            let mut call = VirtualChannelOpen::new(name)
                .with_dynamic(dynamic)
                .with_flags(flags);
            peer.invoke(&mut call, ConnectionId(connection)).await?;

            let (Some(connection_string), Some(instance)) =
                (call.connection_string(), call.instance())
            else {
                return Err(CliError::MissingOutputs);
            };
            println!(
                "{}",
                serde_json::json!({
                    "connection_string": connection_string,
                    "instance": instance,
                })
            );
            Ok(())
        }
        Command::CloseChannel {
            connection,
            name,
            instance,
        } => {
            let mut call = VirtualChannelClose::new(name, instance);
            peer.invoke(&mut call, ConnectionId(connection)).await?;
            println!(
                "{}",
                if call.closed().unwrap_or(false) {
                    "closed"
                } else {
                    "not found"
                }
            );
            Ok(())
        }
        Command::Logoff { connection } => {
            let mut call = LogoffSession::new();
            peer.invoke(&mut call, ConnectionId(connection)).await?;
            println!(
                "{}",
                if call.logged_off().unwrap_or(false) {
                    "logged off"
                } else {
                    "no such session"
                }
            );
            Ok(())
        }
    }
}
