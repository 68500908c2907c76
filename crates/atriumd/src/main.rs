mod handlers;
mod state;

use std::{
    fs, io,
    os::unix::fs::FileTypeExt,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use atrium_core::{ICP_PROTOCOL_VERSION, default_socket_path};
use atrium_icp::serve_unix;
use clap::Parser;
use handlers::build_registry;
use state::ChannelStore;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "atriumd", about = "Atrium session broker daemon")]
struct Args {
    /// ICP socket to bind; defaults to $ATRIUM_SOCKET or /tmp/atriumd.sock.
    #[arg(long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("atriumd error: {err}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();
    let socket = args.socket.unwrap_or_else(default_socket_path);
    prepare_socket_path(&socket)?;

    let store = Arc::new(ChannelStore::new());
    let registry = Arc::new(build_registry(store));

    info!(
        socket = %socket.display(),
        daemon = env!("CARGO_PKG_VERSION"),
        protocol = ICP_PROTOCOL_VERSION,
        "starting atriumd"
    );

    serve_unix(&socket, registry).await?;
    Ok(())
}

fn prepare_socket_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() {
                fs::remove_file(path)
            } else {
                Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a socket", path.display()),
                ))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
