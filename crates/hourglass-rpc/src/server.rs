use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use hourglass_core::error::ProtocolError;
use hourglass_core::types::{RecordId, Window};
use hourglass_state::ProtocolEngine;

use crate::api::HourglassApiServer;
use crate::types::*;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Map a protocol failure to its fixed application code. The message is
/// prefixed with the kind name so callers can match on it without the code.
fn protocol_err(e: ProtocolError) -> ErrorObject<'static> {
    let code = match &e {
        ProtocolError::InvalidWindow(_) => INVALID_WINDOW,
        ProtocolError::ReplayedNonce => REPLAYED_NONCE,
        ProtocolError::UnknownOrBurnedRecord(_) => UNKNOWN_OR_BURNED_RECORD,
        ProtocolError::TimeLockNotReached { .. } => TIME_LOCK_NOT_REACHED,
        ProtocolError::ChecksumMismatch => CHECKSUM_MISMATCH,
        ProtocolError::InternalChainError(_) => INTERNAL_CHAIN_ERROR,
        ProtocolError::DuplicateWindow(_) => DUPLICATE_WINDOW,
        ProtocolError::Serialization(_) | ProtocolError::Storage(_) | ProtocolError::Other(_) => {
            warn!(error = %e, "RPC: internal failure");
            INTERNAL_ERROR
        }
    };
    rpc_err(code, format!("{}: {e}", e.kind()))
}

fn require_nonce(nonce: &str) -> Result<(), ErrorObject<'static>> {
    if nonce.is_empty() {
        return Err(rpc_err(INVALID_PARAMS, "request_nonce must not be empty"));
    }
    Ok(())
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub engine: Arc<ProtocolEngine>,
    /// Whether `hourglass_reset` is honoured.
    pub allow_reset: bool,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address and a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let cors = ServiceBuilder::new().layer(CorsLayer::permissive());
        let server = Server::builder()
            .set_http_middleware(cors)
            .build(addr)
            .await?;
        let bound = server.local_addr()?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(addr = %bound, "RPC server started");
        Ok((bound, handle))
    }

    fn status_now(&self) -> RpcResult<RpcStatus> {
        let s = self.state.engine.status().map_err(protocol_err)?;
        Ok(RpcStatus {
            current_tick: s.current_tick,
            chain_length: s.chain_length,
            max_horizon: self.state.engine.config().max_horizon,
        })
    }
}

#[async_trait]
impl HourglassApiServer for RpcServer {
    async fn status(&self) -> RpcResult<RpcStatus> {
        self.status_now()
    }

    async fn encrypt(&self, request: RpcEncryptRequest) -> RpcResult<RpcCapsule> {
        require_nonce(&request.request_nonce)?;
        let payload = hex::decode(&request.payload)
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid payload hex: {e}")))?;
        if payload.is_empty() {
            return Err(rpc_err(INVALID_PARAMS, "payload must not be empty"));
        }

        let window = Window::new(request.t_start, request.t_end);
        let receipt = self
            .state
            .engine
            .encrypt(&payload, window, &request.request_nonce)
            .map_err(protocol_err)?;

        Ok(RpcCapsule {
            record_id: receipt.record_id.to_hex(),
            wrapped_secret: hex::encode(&receipt.ciphertext),
            iv: hex::encode(receipt.iv),
            seed: receipt.params.seed.to_hex(),
            salt: hex::encode(&receipt.params.salt),
            t_start: window.start,
            t_end: window.end,
        })
    }

    async fn verify(&self, request: RpcVerifyRequest) -> RpcResult<RpcReveal> {
        require_nonce(&request.request_nonce)?;
        let claim = hex::decode(&request.checksum)
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid checksum hex: {e}")))?;
        let record_id = request
            .record_id
            .as_deref()
            .map(RecordId::from_hex)
            .transpose()
            .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid record id: {e}")))?;

        let window = Window::new(request.t_start, request.t_end);
        let reveal = self
            .state
            .engine
            .verify(&claim, window, &request.request_nonce, record_id.as_ref())
            .map_err(protocol_err)?;

        Ok(RpcReveal {
            k_public: reveal.k_public.to_hex(),
            k_private: hex::encode(&reveal.k_private[..]),
        })
    }

    async fn reset(&self) -> RpcResult<RpcStatus> {
        if !self.state.allow_reset {
            warn!("RPC: reset refused, node started without --allow-reset");
            return Err(rpc_err(RESET_DISABLED, "reset is disabled on this node"));
        }
        self.state.engine.reset().map_err(protocol_err)?;
        self.status_now()
    }
}
