use hourglass_core::constants::{IV_LEN, SECRET_LEN};
use hourglass_core::types::{ChainParams, Digest, Window};
use zeroize::Zeroizing;

use crate::chain::ChainState;
use crate::error::CryptoError;
use crate::kdf::derive_final_key;
use crate::wrap::unwrap_secret;

/// Off-server mirror of the chain and key derivation.
///
/// Built from the `seed`/`salt` published by Encrypt; recomputes the window
/// checksum that Verify expects as proof, then unwraps the payload once the
/// server has revealed `k_private`.
#[derive(Debug, Clone)]
pub struct ClientVerifier {
    chain: ChainState,
}

impl ClientVerifier {
    pub fn new(params: ChainParams) -> Self {
        Self {
            chain: ChainState::new(params),
        }
    }

    /// Construct from the hex strings carried in an Encrypt response.
    pub fn from_hex(seed_hex: &str, salt_hex: &str) -> Result<Self, hex::FromHexError> {
        let seed = Digest::from_hex(seed_hex)?;
        let salt = hex::decode(salt_hex)?;
        Ok(Self::new(ChainParams { seed, salt }))
    }

    pub fn params(&self) -> &ChainParams {
        self.chain.params()
    }

    /// Proof value for `window`: the checksum over its chain links.
    pub fn checksum(&mut self, window: &Window) -> Result<Digest, CryptoError> {
        self.chain.extend_to(window.end);
        self.chain.checksum(window)
    }

    /// Derive `k_final` from the revealed halves and unwrap the payload.
    pub fn open(
        &self,
        k_public: &Digest,
        k_private: &[u8; SECRET_LEN],
        ciphertext: &[u8],
        iv: &[u8; IV_LEN],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let k_final = derive_final_key(k_public, k_private)?;
        unwrap_secret(&k_final, ciphertext, iv)
    }
}
