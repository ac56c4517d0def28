use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcCapsule, RpcEncryptRequest, RpcReveal, RpcStatus, RpcVerifyRequest};

/// Hourglass JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "hourglass_" via `namespace = "hourglass"`.
#[rpc(server, namespace = "hourglass")]
pub trait HourglassApi {
    /// Current tick and number of materialised chain links.
    #[method(name = "status")]
    async fn status(&self) -> RpcResult<RpcStatus>;

    /// Time-lock a hex payload until `t_end`. Returns the capsule the client
    /// keeps: wrapped payload, IV, record id and the chain's seed and salt.
    #[method(name = "encrypt")]
    async fn encrypt(&self, request: RpcEncryptRequest) -> RpcResult<RpcCapsule>;

    /// Present the window checksum once the clock has reached `t_end`.
    /// Succeeds at most once per record.
    #[method(name = "verify")]
    async fn verify(&self, request: RpcVerifyRequest) -> RpcResult<RpcReveal>;

    /// Discard every record and start over with a fresh chain.
    /// Refused unless the node was started with `--allow-reset`.
    #[method(name = "reset")]
    async fn reset(&self) -> RpcResult<RpcStatus>;
}
