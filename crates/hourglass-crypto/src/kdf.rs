use hkdf::Hkdf;
use hourglass_core::constants::{KDF_INFO, KDF_SALT, KEY_LEN, SECRET_LEN};
use hourglass_core::types::Digest;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// HKDF-SHA256 extract-and-expand with explicit salt and context info.
pub fn hkdf_sha256(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new(vec![0u8; len]);
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::KdfLength(len))?;
    Ok(okm)
}

/// `k_final = HKDF(ikm = k_public || k_private, salt = "encryption", info = "aes_gcm_key")`.
pub fn derive_final_key(
    k_public: &Digest,
    k_private: &[u8; SECRET_LEN],
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let mut ikm = Zeroizing::new([0u8; 64]);
    ikm[..32].copy_from_slice(k_public.as_bytes());
    ikm[32..].copy_from_slice(k_private);

    let okm = hkdf_sha256(&ikm[..], KDF_SALT, KDF_INFO, KEY_LEN)?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&okm);
    Ok(key)
}
