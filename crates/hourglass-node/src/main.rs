//! hourglass-node: the time-lock server binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Load or seed the hash chain and resume the clock at the stored tick
//!   3. Start the ticker that advances the clock once per `--tick-ms`
//!   4. Start the JSON-RPC 2.0 server
//!   5. Run until Ctrl-C, then stop the server and flush state

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use hourglass_core::constants::{DEFAULT_MAX_HORIZON, DEFAULT_TICK_MS};
use hourglass_rpc::server::RpcServerState;
use hourglass_rpc::RpcServer;
use hourglass_state::{spawn_ticker, EngineConfig, ProtocolEngine, StateDb};

#[derive(Parser, Debug)]
#[command(
    name = "hourglass-node",
    version,
    about = "Hourglass node, commit now and reveal later"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.hourglass/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:5001")]
    rpc_addr: SocketAddr,

    /// Milliseconds between clock ticks.
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Furthest a window may end, in ticks past the current one.
    #[arg(long, default_value_t = DEFAULT_MAX_HORIZON)]
    max_horizon: u64,

    /// Honour `hourglass_reset` requests.
    #[arg(long)]
    allow_reset: bool,

    /// Keep all state in a temporary database that is discarded on exit.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hourglass=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Hourglass node starting");

    if args.tick_ms == 0 {
        anyhow::bail!("--tick-ms must be at least 1");
    }

    // ── State database ────────────────────────────────────────────────────────
    let db = if args.ephemeral {
        info!("ephemeral mode, state is discarded on exit");
        StateDb::temporary().context("opening temporary database")?
    } else {
        let data_dir = expand_tilde(&args.data_dir);
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;
        StateDb::open(&data_dir).context("opening state database")?
    };
    let db = Arc::new(db);

    // ── Protocol engine ───────────────────────────────────────────────────────
    let config = EngineConfig {
        max_horizon: args.max_horizon,
        tick_period: Duration::from_millis(args.tick_ms),
    };
    let engine = Arc::new(
        ProtocolEngine::open(Arc::clone(&db), config.clone()).context("opening protocol engine")?,
    );

    // ── Clock ─────────────────────────────────────────────────────────────────
    let ticker = spawn_ticker(Arc::clone(&engine), config.tick_period);

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        engine: Arc::clone(&engine),
        allow_reset: args.allow_reset,
    });
    let (rpc_addr, rpc_handle) = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(
        %rpc_addr,
        tick_ms = args.tick_ms,
        max_horizon = args.max_horizon,
        allow_reset = args.allow_reset,
        "node ready"
    );

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("shutting down");

    ticker.abort();
    if rpc_handle.stop().is_err() {
        warn!("RPC server already stopped");
    }
    rpc_handle.stopped().await;
    db.flush().context("flushing state database")?;

    Ok(())
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
