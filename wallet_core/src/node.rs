//! JSON-RPC client for the full node that backs the wallet's sync gate.

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::WalletError;

/// The subset of `getblockchaininfo` the wallet cares about.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ChainInfo {
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub blocks: u64,
    #[serde(default)]
    pub headers: u64,
    #[serde(rename = "initialblockdownload", default)]
    pub initial_block_download: bool,
}

impl ChainInfo {
    /// The node has left initial block download and caught up with its headers.
    pub fn is_synced(&self) -> bool {
        !self.initial_block_download && self.blocks >= self.headers
    }
}

/// HTTP client for a node's JSON-RPC endpoint.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    node_url: String,
    auth: Option<(String, String)>,
}

impl NodeClient {
    /// Create a client targeting e.g. `http://127.0.0.1:8332`.
    pub fn new(node_url: impl Into<String>) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WalletError::Node(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
            auth: None,
        })
    }

    /// Use HTTP basic auth (rpcuser / rpcpassword).
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((user.into(), password.into()));
        self
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, WalletError> {
        let body = serde_json::json!({
            "jsonrpc": "1.0",
            "id": "stakegov",
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&self.node_url).json(&body);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| WalletError::Node(format!("request failed: {e}")))?;

        // Nodes report RPC errors with a 500 status and a JSON body.
        let status = response.status();
        let json: serde_json::Value = response.json().await.map_err(|e| {
            WalletError::Node(format!("invalid JSON response (HTTP {status}): {e}"))
        })?;

        match json.get("error") {
            Some(serde_json::Value::Null) | None => {}
            Some(err) => {
                let message = err
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                return Err(WalletError::Node(format!("node error: {message}")));
            }
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| WalletError::Node("response missing 'result' field".into()))
    }

    pub async fn blockchain_info(&self) -> Result<ChainInfo, WalletError> {
        let result = self.rpc_call("getblockchaininfo", serde_json::json!([])).await?;
        let info: ChainInfo = serde_json::from_value(result)
            .map_err(|e| WalletError::Node(format!("unexpected getblockchaininfo shape: {e}")))?;
        debug!(
            blocks = info.blocks,
            headers = info.headers,
            ibd = info.initial_block_download,
            "queried node chain state"
        );
        Ok(info)
    }

    pub async fn is_synced(&self) -> Result<bool, WalletError> {
        Ok(self.blockchain_info().await?.is_synced())
    }
}
