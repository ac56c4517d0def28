use hourglass_core::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("chain index {index} out of range (history length {len})")]
    ChainIndex { index: u64, len: u64 },

    #[error("window start {start} is after end {end}")]
    ReversedWindow { start: u64, end: u64 },

    #[error("KDF output length {0} is invalid")]
    KdfLength(usize),

    #[error("authenticated encryption failed")]
    AeadFailure,
}

impl From<CryptoError> for ProtocolError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::ChainIndex { .. } | CryptoError::ReversedWindow { .. } => {
                ProtocolError::InternalChainError(e.to_string())
            }
            other => ProtocolError::Other(other.to_string()),
        }
    }
}
