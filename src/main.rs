use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use chair_zenoh_runtime::config::IDENTITY_PATH;
use chair_zenoh_runtime::runtime::{self, RuntimeOptions};

#[derive(Parser, Debug)]
#[command(version, about = "Motion runtime for a two-wheel chair")]
struct Args {
    /// Local identity record (created on first run)
    #[arg(long, default_value = IDENTITY_PATH)]
    identity: PathBuf,

    /// Zenoh configuration file (defaults to peer mode with scouting)
    #[arg(long)]
    zenoh_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received ctrl-c");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Failed to listen for ctrl-c: {}", e);
                shutdown_tx.closed().await;
            }
        }
    });

    let options = RuntimeOptions {
        identity_path: args.identity,
        zenoh_config: args.zenoh_config,
    };
    if let Err(e) = runtime::run(options, shutdown_rx).await {
        error!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
