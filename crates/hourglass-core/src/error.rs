use thiserror::Error;

use crate::types::{Tick, Window};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // ── Request validation ───────────────────────────────────────────────────
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("request nonce has already been used")]
    ReplayedNonce,

    // ── Record lifecycle ─────────────────────────────────────────────────────
    #[error("no unburned record for window {0}")]
    UnknownOrBurnedRecord(Window),

    #[error("window {0} already has a record")]
    DuplicateWindow(Window),

    #[error("time-lock not reached: current tick {current}, unlocks at {unlock_at}")]
    TimeLockNotReached { current: Tick, unlock_at: Tick },

    #[error("checksum does not match the window commitment")]
    ChecksumMismatch,

    // ── Internal ─────────────────────────────────────────────────────────────
    #[error("internal chain error: {0}")]
    InternalChainError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl ProtocolError {
    /// Stable kind name surfaced to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::InvalidWindow(_) => "InvalidWindow",
            ProtocolError::ReplayedNonce => "ReplayedNonce",
            ProtocolError::UnknownOrBurnedRecord(_) => "UnknownOrBurnedRecord",
            ProtocolError::DuplicateWindow(_) => "DuplicateWindow",
            ProtocolError::TimeLockNotReached { .. } => "TimeLockNotReached",
            ProtocolError::ChecksumMismatch => "ChecksumMismatch",
            ProtocolError::InternalChainError(_) => "InternalChainError",
            ProtocolError::Serialization(_) => "Serialization",
            ProtocolError::Storage(_) => "Storage",
            ProtocolError::Other(_) => "Other",
        }
    }
}
