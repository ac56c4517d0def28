use anyhow::{bail, Context};
use serde::de::DeserializeOwned;

use hourglass_rpc::types::{
    RpcCapsule, RpcEncryptRequest, RpcReveal, RpcStatus, RpcVerifyRequest,
};

/// Simple JSON-RPC 2.0 client used by the CLI to talk to a running node.
///
/// Uses raw HTTP POST with serde_json rather than the full jsonrpsee client.
pub struct NodeRpcClient {
    url: String,
    client: reqwest::Client,
}

impl NodeRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and decode the `result` field.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<T> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            let code = err["code"].as_i64().unwrap_or_default();
            let message = err["message"].as_str().unwrap_or("unknown error");
            bail!("RPC error {code}: {message}");
        }

        serde_json::from_value(json["result"].clone())
            .with_context(|| format!("decoding {method} result"))
    }

    pub async fn status(&self) -> anyhow::Result<RpcStatus> {
        self.call("hourglass_status", serde_json::json!([])).await
    }

    pub async fn encrypt(&self, request: &RpcEncryptRequest) -> anyhow::Result<RpcCapsule> {
        self.call("hourglass_encrypt", serde_json::json!([request]))
            .await
    }

    pub async fn verify(&self, request: &RpcVerifyRequest) -> anyhow::Result<RpcReveal> {
        self.call("hourglass_verify", serde_json::json!([request]))
            .await
    }

    pub async fn reset(&self) -> anyhow::Result<RpcStatus> {
        self.call("hourglass_reset", serde_json::json!([])).await
    }
}
