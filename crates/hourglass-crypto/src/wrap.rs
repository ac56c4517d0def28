use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hourglass_core::constants::{IV_LEN, KEY_LEN};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// AES-256-GCM ciphertext (tag appended) plus its 96-bit IV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
}

/// Encrypt `payload` under `key` with a freshly generated IV.
pub fn wrap_secret(key: &[u8; KEY_LEN], payload: &[u8]) -> Result<Wrapped, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadFailure)?;
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), payload)
        .map_err(|_| CryptoError::AeadFailure)?;
    Ok(Wrapped { ciphertext, iv })
}

/// Decrypt and authenticate. Fails on a wrong key, IV or any tampering.
pub fn unwrap_secret(
    key: &[u8; KEY_LEN],
    ciphertext: &[u8],
    iv: &[u8; IV_LEN],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadFailure)?;
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AeadFailure)
}
