use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::constants::{IV_LEN, SECRET_LEN};
use crate::types::{Digest, RecordId, Tick, Window};

/// A time-locked record created by Encrypt.
///
/// `ciphertext`/`iv` never change after creation. The only mutation is the
/// burn: `burned` goes false → true exactly once, and that transition is the
/// one moment `k_private` leaves the server.
///
/// Every in-memory copy (fresh, decoded from the store, or burned) wipes its
/// secret fields when dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct TimeLockRecord {
    #[zeroize(skip)]
    pub id: RecordId,
    #[zeroize(skip)]
    pub window: Window,
    pub k_private: [u8; SECRET_LEN],
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub burned: bool,
    pub created_tick: Tick,
    /// Wall-clock creation time (Unix seconds, UTC). Informational only.
    pub created_at: i64,
}

impl TimeLockRecord {
    /// Copy of this record with the burn flag set.
    pub fn into_burned(mut self) -> Self {
        self.burned = true;
        self
    }
}

impl std::fmt::Debug for TimeLockRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeLockRecord")
            .field("id", &self.id)
            .field("window", &self.window)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("burned", &self.burned)
            .field("created_tick", &self.created_tick)
            .finish_non_exhaustive()
    }
}

/// Output of a successful Verify (the burn event).
pub struct Reveal {
    pub k_public: Digest,
    pub k_private: Zeroizing<[u8; SECRET_LEN]>,
}

impl std::fmt::Debug for Reveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reveal {{ k_public: {:?} }}", self.k_public)
    }
}
