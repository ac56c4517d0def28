//! hourglass-state
//!
//! Server-side protocol state: the sled-backed record store and nonce
//! ledger, the tick clock with its background ticker, and the
//! `ProtocolEngine` that runs Encrypt / Verify / Reset over them.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;

pub use clock::{spawn_ticker, Clock};
pub use config::EngineConfig;
pub use db::StateDb;
pub use engine::{EncryptReceipt, ProtocolEngine};
