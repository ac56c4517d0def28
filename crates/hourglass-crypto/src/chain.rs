//! Public non-Markovian hash chain.
//!
//! ```text
//! X_0     = seed
//! X_{i}   = SHA256( X_{i-1} || X_{i-2} || salt || BE64(i-1) )     i >= 1
//! X_{-1}  = 32 zero bytes
//! ```
//!
//! The chain is a pure function of `(seed, salt)`: anyone holding the
//! published parameters computes byte-identical links, ahead of the server
//! clock if they like. It provides agreement, not delay.

use hourglass_core::types::{ChainParams, Digest, Window};
use sha2::{Digest as _, Sha256};

use crate::error::CryptoError;

/// Compute the link that follows `current`, where `previous` is the link
/// before it and `step` is the index of `current`.
fn next_link(current: &Digest, previous: &Digest, salt: &[u8], step: u64) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(current.as_bytes());
    hasher.update(previous.as_bytes());
    hasher.update(salt);
    hasher.update(step.to_be_bytes());
    Digest::from_bytes(hasher.finalize().into())
}

fn grow(history: &mut Vec<Digest>, salt: &[u8], index: u64) {
    while (history.len() as u64) <= index {
        let len = history.len();
        let current = history[len - 1];
        let previous = if len >= 2 { history[len - 2] } else { Digest::ZERO };
        history.push(next_link(&current, &previous, salt, (len - 1) as u64));
    }
}

/// Build `history[0..=n]` from scratch (`n + 1` links).
pub fn extend(seed: &Digest, salt: &[u8], n: u64) -> Vec<Digest> {
    let mut history = Vec::with_capacity(n as usize + 1);
    history.push(*seed);
    grow(&mut history, salt, n);
    history
}

/// `SHA256(history[start] || … || history[end])`, inclusive on both ends.
pub fn checksum(history: &[Digest], window: &Window) -> Result<Digest, CryptoError> {
    if window.start > window.end {
        return Err(CryptoError::ReversedWindow {
            start: window.start,
            end: window.end,
        });
    }
    let len = history.len() as u64;
    if window.end >= len {
        return Err(CryptoError::ChainIndex {
            index: window.end,
            len,
        });
    }
    let mut hasher = Sha256::new();
    for link in &history[window.start as usize..=window.end as usize] {
        hasher.update(link.as_bytes());
    }
    Ok(Digest::from_bytes(hasher.finalize().into()))
}

/// Append-only cached chain for one set of parameters.
#[derive(Debug, Clone)]
pub struct ChainState {
    params: ChainParams,
    history: Vec<Digest>,
}

impl ChainState {
    /// Chain holding only the seed.
    pub fn new(params: ChainParams) -> Self {
        let history = vec![params.seed];
        Self { params, history }
    }

    /// Chain rebuilt up to and including `index`.
    pub fn rebuilt(params: ChainParams, index: u64) -> Self {
        let mut chain = Self::new(params);
        chain.extend_to(index);
        chain
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn history(&self) -> &[Digest] {
        &self.history
    }

    pub fn len(&self) -> u64 {
        self.history.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Make sure `history[index]` exists. Never shrinks.
    pub fn extend_to(&mut self, index: u64) {
        grow(&mut self.history, &self.params.salt, index);
    }

    pub fn checksum(&self, window: &Window) -> Result<Digest, CryptoError> {
        checksum(&self.history, window)
    }
}
