use serde::{Deserialize, Serialize};

// ── Error codes ──────────────────────────────────────────────────────────────

pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub const INVALID_WINDOW: i32 = -32001;
pub const REPLAYED_NONCE: i32 = -32002;
pub const UNKNOWN_OR_BURNED_RECORD: i32 = -32003;
pub const TIME_LOCK_NOT_REACHED: i32 = -32004;
pub const CHECKSUM_MISMATCH: i32 = -32005;
pub const INTERNAL_CHAIN_ERROR: i32 = -32006;
pub const DUPLICATE_WINDOW: i32 = -32007;
pub const RESET_DISABLED: i32 = -32010;

/// Returned by `hourglass_status` and `hourglass_reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    pub current_tick: u64,
    pub chain_length: u64,
    /// Furthest `t_end` an encrypt request may name, relative to `current_tick`.
    pub max_horizon: u64,
}

/// Parameters of `hourglass_encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEncryptRequest {
    /// Hex-encoded secret to lock.
    pub payload: String,
    pub t_start: u64,
    pub t_end: u64,
    pub request_nonce: String,
}

/// Everything a client needs to later prove the window and unwrap the payload.
/// All byte fields are lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcCapsule {
    pub record_id: String,
    pub wrapped_secret: String,
    pub iv: String,
    pub seed: String,
    pub salt: String,
    pub t_start: u64,
    pub t_end: u64,
}

/// Parameters of `hourglass_verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcVerifyRequest {
    /// Hex-encoded 32-byte window checksum.
    pub checksum: String,
    pub t_start: u64,
    pub t_end: u64,
    pub request_nonce: String,
    /// When present, must name the record registered for the window.
    #[serde(default)]
    pub record_id: Option<String>,
}

/// Both key halves, hex-encoded. `k_final` is derived client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcReveal {
    pub k_public: String,
    pub k_private: String,
}
