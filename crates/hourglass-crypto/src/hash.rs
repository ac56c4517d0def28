use hourglass_core::constants::RECORD_ID_DOMAIN;
use hourglass_core::types::{Digest, RecordId, Tick, Window};
use sha2::{Digest as _, Sha256};

/// SHA-256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> Digest {
    Digest::from_bytes(Sha256::digest(data).into())
}

/// Derive a RecordId using BLAKE3 over the window, creation tick and entropy.
pub fn record_id(window: &Window, created_tick: Tick, entropy: &[u8; 16]) -> RecordId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(RECORD_ID_DOMAIN);
    hasher.update(&window.key_bytes());
    hasher.update(&created_tick.to_be_bytes());
    hasher.update(entropy);
    RecordId::from_bytes(*hasher.finalize().as_bytes())
}
