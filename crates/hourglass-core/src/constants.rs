/// ─── Hourglass Protocol Constants ───────────────────────────────────────────
///
/// Commit now, reveal later: a payload is wrapped immediately and the key
/// half needed to unwrap it is released once the server clock reaches the
/// window's end tick.

// ── Sizes ────────────────────────────────────────────────────────────────────

/// Length of every chain digest and of `k_public` (SHA-256 output).
pub const DIGEST_LEN: usize = 32;

/// Length of the per-record private secret `k_private`.
pub const SECRET_LEN: usize = 32;

/// Length of the public chain salt generated on (re)seed.
pub const SALT_LEN: usize = 32;

/// AEAD key length (AES-256-GCM) and KDF output length.
pub const KEY_LEN: usize = 32;

/// AEAD nonce length (96-bit IV).
pub const IV_LEN: usize = 12;

// ── Key derivation domain separation ─────────────────────────────────────────

/// HKDF salt for `k_final = HKDF(k_public || k_private)`.
pub const KDF_SALT: &[u8] = b"encryption";

/// HKDF context info for `k_final`.
pub const KDF_INFO: &[u8] = b"aes_gcm_key";

/// Domain prefix hashed into every record identifier.
pub const RECORD_ID_DOMAIN: &[u8] = b"hourglass-record-v1";

// ── Clock / horizon defaults ─────────────────────────────────────────────────

/// Default clock period: one tick per second.
pub const DEFAULT_TICK_MS: u64 = 1_000;

/// How far past the current tick an encrypt window may end.
pub const DEFAULT_MAX_HORIZON: u64 = 100;
