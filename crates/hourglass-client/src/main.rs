//! hourglass-client
//!
//! CLI for locking payloads on a running node and unlocking them once the
//! window has passed. Recomputes the window checksum and the final key
//! locally; the node only ever releases `k_private`.
//!
//! Usage:
//!   hourglass-client status   [--rpc <url>]
//!   hourglass-client encrypt  --payload <hex> --start <tick> --end <tick> [--out <file>]
//!   hourglass-client checksum --seed <hex> --salt <hex> --start <tick> --end <tick>
//!   hourglass-client unlock   --capsule <file> [--wait]
//!   hourglass-client reset

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rand::RngCore;
use tracing::info;
use zeroize::Zeroizing;

use hourglass_core::constants::{IV_LEN, SECRET_LEN};
use hourglass_core::types::{Digest, Window};
use hourglass_crypto::ClientVerifier;
use hourglass_rpc::types::{RpcCapsule, RpcEncryptRequest, RpcReveal, RpcVerifyRequest};

mod rpc_client;
use rpc_client::NodeRpcClient;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Highest `t_end` the client will build a chain for locally (32 MiB of links).
const MAX_LOCAL_END: u64 = 1 << 20;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "hourglass-client",
    version,
    about = "Hourglass client, lock a payload now and unlock it later"
)]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:5001")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node's current tick and chain length.
    Status,

    /// Lock a payload until the end of a window and print the capsule.
    Encrypt {
        /// Payload to lock, hex-encoded.
        #[arg(long)]
        payload: String,
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
        /// Also write the capsule JSON to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compute a window checksum offline from published chain parameters.
    Checksum {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        salt: String,
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
    },

    /// Prove the window of a capsule and print the unwrapped payload.
    Unlock {
        /// Capsule JSON produced by `encrypt`.
        #[arg(long)]
        capsule: PathBuf,
        /// Poll the node until its clock reaches the window end first.
        #[arg(long, default_value_t = false)]
        wait: bool,
    },

    /// Wipe every record on the node and start a new chain.
    Reset,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn,hourglass_client=info")
        .init();

    let args = Args::parse();
    let client = NodeRpcClient::new(&args.rpc);

    match args.command {
        Command::Status => {
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }

        Command::Encrypt { payload, start, end, out } => {
            let request = RpcEncryptRequest {
                payload,
                t_start: start,
                t_end: end,
                request_nonce: fresh_nonce(),
            };
            let capsule = client.encrypt(&request).await?;
            let json = serde_json::to_string_pretty(&capsule)?;
            if let Some(path) = out {
                std::fs::write(&path, &json)
                    .with_context(|| format!("writing capsule to {}", path.display()))?;
                info!(path = %path.display(), "capsule saved");
            }
            println!("{json}");
            Ok(())
        }

        Command::Checksum { seed, salt, start, end } => {
            let mut verifier =
                ClientVerifier::from_hex(&seed, &salt).context("decoding seed/salt hex")?;
            let window = local_window(start, end)?;
            let sum = verifier.checksum(&window)?;
            println!("{sum}");
            Ok(())
        }

        Command::Unlock { capsule, wait } => {
            let json = std::fs::read_to_string(&capsule)
                .with_context(|| format!("reading capsule {}", capsule.display()))?;
            let capsule: RpcCapsule =
                serde_json::from_str(&json).context("parsing capsule JSON")?;
            let payload = cmd_unlock(&client, &capsule, wait).await?;
            println!("{}", hex::encode(payload.as_slice()));
            Ok(())
        }

        Command::Reset => {
            let status = client.reset().await?;
            println!("Reset. Clock back at tick {}", status.current_tick);
            Ok(())
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_unlock(
    client: &NodeRpcClient,
    capsule: &RpcCapsule,
    wait: bool,
) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let mut verifier = ClientVerifier::from_hex(&capsule.seed, &capsule.salt)
        .context("decoding capsule seed/salt")?;
    let window = local_window(capsule.t_start, capsule.t_end)?;
    let proof = verifier.checksum(&window)?;

    if wait {
        loop {
            let status = client.status().await?;
            if status.current_tick >= window.end {
                break;
            }
            info!(
                tick = status.current_tick,
                unlock_at = window.end,
                "waiting for window to close"
            );
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    let reveal = client
        .verify(&RpcVerifyRequest {
            checksum: proof.to_hex(),
            t_start: window.start,
            t_end: window.end,
            request_nonce: fresh_nonce(),
            record_id: Some(capsule.record_id.clone()),
        })
        .await?;

    open_capsule(&verifier, capsule, &reveal, &proof)
}

/// Check the revealed `k_public` against our own checksum, then unwrap.
fn open_capsule(
    verifier: &ClientVerifier,
    capsule: &RpcCapsule,
    reveal: &RpcReveal,
    proof: &Digest,
) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let k_public = Digest::from_hex(&reveal.k_public).context("decoding k_public")?;
    if k_public != *proof {
        bail!("node returned k_public {k_public}, expected {proof}");
    }

    let k_private: Zeroizing<[u8; SECRET_LEN]> = Zeroizing::new(
        hex::decode(&reveal.k_private)
            .context("decoding k_private")?
            .try_into()
            .map_err(|_| anyhow::anyhow!("k_private must be {SECRET_LEN} bytes"))?,
    );
    let iv: [u8; IV_LEN] = hex::decode(&capsule.iv)
        .context("decoding iv")?
        .try_into()
        .map_err(|_| anyhow::anyhow!("iv must be {IV_LEN} bytes"))?;
    let ciphertext = hex::decode(&capsule.wrapped_secret).context("decoding wrapped secret")?;

    Ok(verifier.open(&k_public, &k_private, &ciphertext, &iv)?)
}

/// Validate a window before extending the chain to its end.
fn local_window(start: u64, end: u64) -> anyhow::Result<Window> {
    let window = Window::new(start, end);
    if !window.is_ordered() {
        bail!("window start {start} must be before end {end}");
    }
    if end > MAX_LOCAL_END {
        bail!("window end {end} is beyond the local limit of {MAX_LOCAL_END}");
    }
    Ok(window)
}

/// 128 random bits, hex-encoded.
fn fresh_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
