//! hourglass-rpc
//!
//! JSON-RPC 2.0 server for Hourglass nodes.
//!
//! Namespace: "hourglass"
//! Methods:
//!   hourglass_status   current tick and chain length
//!   hourglass_encrypt  time-lock a payload until the end of a window
//!   hourglass_verify   release the private key half for an unlocked window
//!   hourglass_reset    wipe all state and start a new chain (opt-in)

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{RpcCapsule, RpcEncryptRequest, RpcReveal, RpcStatus, RpcVerifyRequest};
