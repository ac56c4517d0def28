//! hourglass-crypto
//!
//! Pure functions shared by the server and by clients:
//! the public hash chain and its window checksum, the `k_final`
//! derivation, AES-256-GCM wrapping, and the client-side verifier
//! that recomputes all of it from published parameters.

pub mod chain;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod verifier;
pub mod wrap;

pub use chain::{checksum, extend, ChainState};
pub use error::CryptoError;
pub use hash::{record_id, sha256};
pub use kdf::{derive_final_key, hkdf_sha256};
pub use verifier::ClientVerifier;
pub use wrap::{unwrap_secret, wrap_secret, Wrapped};
