use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DIGEST_LEN;

/// Server clock value. Starts at 0 and only ever increases by one.
pub type Tick = u64;

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], hex::FromHexError> {
    let bytes = hex::decode(s)?;
    bytes
        .try_into()
        .map_err(|_| hex::FromHexError::InvalidStringLength)
}

// ── Digest ───────────────────────────────────────────────────────────────────

/// 32-byte SHA-256 output: a chain link or a window checksum (`k_public`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    pub fn from_bytes(b: [u8; DIGEST_LEN]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}…)", &self.to_hex()[..16])
    }
}

// ── RecordId ─────────────────────────────────────────────────────────────────

/// Opaque identifier returned by Encrypt: BLAKE3 over the window, the
/// creation tick and fresh randomness.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub [u8; 32]);

impl RecordId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({}…)", &self.to_hex()[..16])
    }
}

// ── Window ───────────────────────────────────────────────────────────────────

/// Commitment range `[start, end]`, inclusive on both ends. `end` is also the
/// unlock tick.
///
/// Construction does not validate ordering: Verify must be able to look up
/// arbitrary (possibly malformed) windows and report them as unknown.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Window {
    pub start: Tick,
    pub end: Tick,
}

impl Window {
    pub fn new(start: Tick, end: Tick) -> Self {
        Self { start, end }
    }

    /// `start < end`.
    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }

    /// Fixed-width key used by the window index: BE64(start) || BE64(end).
    pub fn key_bytes(&self) -> [u8; 16] {
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&self.start.to_be_bytes());
        key[8..].copy_from_slice(&self.end.to_be_bytes());
        key
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window[{}, {}]", self.start, self.end)
    }
}

// ── ChainParams ──────────────────────────────────────────────────────────────

/// Standing public parameters of the hash chain. Constant until Reset.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ChainParams {
    pub seed: Digest,
    pub salt: Vec<u8>,
}

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Status {
    pub current_tick: Tick,
    pub chain_length: u64,
}
