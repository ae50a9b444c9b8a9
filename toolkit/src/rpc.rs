//! # RPC Gateway
//!
//! The only module that performs network I/O. One [`RpcGateway`] speaks
//! JSON-RPC 2.0 to one resolved endpoint over HTTPS.
//!
//! Failure mapping is uniform across every method:
//!
//! - transport problems (connect, timeout, HTTP status, unparseable body)
//!   become [`ToolError::NetworkUnavailable`];
//! - a well-formed JSON-RPC error object becomes [`ToolError::RpcError`]
//!   with the remote code and message intact;
//! - a query that legitimately finds nothing returns `Ok(None)`.
//!
//! Every call is bounded by the client-wide timeout. There are no retries:
//! blockhash freshness is time-sensitive, and the caller is better placed
//! to decide whether re-fetching is worth it.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cluster::Cluster;
use crate::config::{JSONRPC_VERSION, RPC_TIMEOUT};
use crate::error::ToolError;
use crate::keys::Address;
use crate::wire::Blockhash;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// A JSON-RPC client bound to a single endpoint.
#[derive(Debug, Clone)]
pub struct RpcGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl RpcGateway {
    /// Builds a gateway for an explicit endpoint URL.
    ///
    /// Exists so tests and local validators can be pointed at; production
    /// callers go through [`for_cluster`](Self::for_cluster).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .map_err(|err| ToolError::NetworkUnavailable(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Builds a gateway for one of the three public clusters.
    pub fn for_cluster(cluster: Cluster) -> Result<Self, ToolError> {
        Self::new(cluster.rpc_url())
    }

    /// The endpoint this gateway talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the latest blockhash, the freshness token every transaction
    /// must embed.
    pub async fn latest_blockhash(&self) -> Result<Blockhash, ToolError> {
        let reply = self.call("getLatestBlockhash", json!([])).await?;
        let encoded = reply
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .ok_or_else(|| unusable("getLatestBlockhash reply carried no blockhash"))?;
        Blockhash::from_base58(encoded)
            .ok_or_else(|| unusable("getLatestBlockhash returned a non-blockhash string"))
    }

    /// Submits raw transaction bytes. Fire-and-forget: the returned string
    /// is the transaction signature, not a confirmation.
    pub async fn send_transaction(&self, wire_bytes: &[u8]) -> Result<String, ToolError> {
        let encoded = BASE64_STANDARD.encode(wire_bytes);
        let reply = self
            .call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64" }]),
            )
            .await?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| unusable("sendTransaction reply was not a signature string"))
    }

    /// Looks up an account. `Ok(None)` when the account does not exist.
    pub async fn account_info(&self, address: &Address) -> Result<Option<Value>, ToolError> {
        let reply = self
            .call(
                "getAccountInfo",
                json!([address.to_base58(), { "encoding": "base64" }]),
            )
            .await?;
        Ok(non_null(reply.pointer("/value")))
    }

    /// The account's balance in lamports. Nonexistent accounts have a
    /// balance of zero, so this never maps to `None`.
    pub async fn balance(&self, address: &Address) -> Result<u64, ToolError> {
        let reply = self
            .call("getBalance", json!([address.to_base58()]))
            .await?;
        reply
            .pointer("/value")
            .and_then(Value::as_u64)
            .ok_or_else(|| unusable("getBalance reply carried no lamport value"))
    }

    /// The minimum lamport balance that makes an account of `data_size`
    /// bytes rent-exempt.
    pub async fn minimum_balance_for_rent_exemption(
        &self,
        data_size: usize,
    ) -> Result<u64, ToolError> {
        let reply = self
            .call("getMinimumBalanceForRentExemption", json!([data_size]))
            .await?;
        reply
            .as_u64()
            .ok_or_else(|| unusable("getMinimumBalanceForRentExemption reply was not an integer"))
    }

    /// Looks up a confirmed transaction by signature. `Ok(None)` when the
    /// signature is unknown to the cluster.
    pub async fn transaction(&self, signature: &str) -> Result<Option<Value>, ToolError> {
        let reply = self
            .call(
                "getTransaction",
                json!([signature, { "encoding": "json" }]),
            )
            .await?;
        Ok(non_null(Some(&reply)))
    }

    /// Requests an airdrop of `lamports` to `address`. Only meaningful on
    /// clusters that fund airdrops; the remote end rejects it elsewhere.
    pub async fn request_airdrop(
        &self,
        address: &Address,
        lamports: u64,
    ) -> Result<String, ToolError> {
        let reply = self
            .call("requestAirdrop", json!([address.to_base58(), lamports]))
            .await?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| unusable("requestAirdrop reply was not a signature string"))
    }

    /// Performs one JSON-RPC round-trip.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        debug!(method, endpoint = %self.endpoint, "rpc call");

        let payload = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| ToolError::NetworkUnavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| ToolError::NetworkUnavailable(err.to_string()))?;

        let reply: RpcReply = response
            .json()
            .await
            .map_err(|err| ToolError::NetworkUnavailable(err.to_string()))?;

        interpret(reply)
    }
}

// ---------------------------------------------------------------------------
// Reply Handling
// ---------------------------------------------------------------------------

/// The JSON-RPC 2.0 response envelope, reduced to the parts that matter.
#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Splits a reply into value or failure.
///
/// A `"result": null` is a legitimate reply (an absent transaction, say)
/// and comes out as `Value::Null` for the caller to interpret. Only a reply
/// with neither result nor error is treated as transport-level garbage.
fn interpret(reply: RpcReply) -> Result<Value, ToolError> {
    if let Some(err) = reply.error {
        return Err(ToolError::RpcError {
            code: err.code,
            message: err.message,
        });
    }
    match reply.result {
        Some(value) => Ok(value),
        None => Ok(Value::Null),
    }
}

/// Collapses JSON `null` (and a missing pointer target) into `None`.
fn non_null(value: Option<&Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(other) => Some(other.clone()),
    }
}

fn unusable(what: &str) -> ToolError {
    ToolError::NetworkUnavailable(what.to_string())
}
