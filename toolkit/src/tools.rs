//! # Tool Dispatcher
//!
//! The boundary between the transport and the pipeline. A [`ToolCall`] is a
//! typed, named operation; [`Dispatcher::dispatch`] routes it through the
//! assembly/signing/codec/RPC components and folds every outcome into a
//! [`ToolResponse`].
//!
//! Nothing propagates past this module. A component failure becomes a
//! textual error payload, never a panic and never a transport-level crash.
//! Success and failure are distinguished by the `is_error` flag and payload
//! content only.
//!
//! Every call names its own cluster. There is no process-wide default
//! endpoint: a balance query against devnet and a send against testnet can
//! interleave freely because each call resolves its own gateway.
//!
//! Secret keys arrive as call arguments, are decoded, used, and dropped
//! inside the one call that carries them. They never appear in responses,
//! error messages, or log lines.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::assembler::assemble;
use crate::cluster::Cluster;
use crate::config::LAMPORTS_PER_SOL;
use crate::error::ToolError;
use crate::instruction::InstructionDescriptor;
use crate::keys::{Address, Keypair};
use crate::rpc::RpcGateway;
use crate::signing::sign_envelope;
use crate::wire::TransactionEnvelope;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Every tool the dispatcher knows, by its external name.
pub const TOOL_NAMES: [&str; 7] = [
    "buildTransaction",
    "signAndSendTransaction",
    "getAccountInfo",
    "getBalance",
    "getMinimumBalanceForRentExemption",
    "getTransaction",
    "requestAirdrop",
];

/// One typed tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "camelCase")]
pub enum ToolCall {
    /// Assemble, sign, and encode a transaction from instruction descriptors.
    #[serde(rename_all = "camelCase")]
    BuildTransaction {
        instructions: Vec<Value>,
        cluster: String,
        fee_payer: String,
        signer_secret_key: String,
    },
    /// Re-sign an encoded transaction and submit it.
    #[serde(rename_all = "camelCase")]
    SignAndSendTransaction {
        transaction_base64: String,
        secret_key: String,
        cluster: String,
    },
    /// Look up an account's metadata and data.
    #[serde(rename_all = "camelCase")]
    GetAccountInfo { public_key: String, cluster: String },
    /// Look up an account's lamport balance.
    #[serde(rename_all = "camelCase")]
    GetBalance { public_key: String, cluster: String },
    /// The rent-exempt minimum for an account of a given data size.
    #[serde(rename_all = "camelCase")]
    GetMinimumBalanceForRentExemption { data_size: usize, cluster: String },
    /// Look up a confirmed transaction by signature.
    #[serde(rename_all = "camelCase")]
    GetTransaction { signature: String, cluster: String },
    /// Request an airdrop on a cluster that funds them.
    #[serde(rename_all = "camelCase")]
    RequestAirdrop {
        public_key: String,
        lamports: u64,
        cluster: String,
    },
}

impl ToolCall {
    /// Parses a named tool invocation from its JSON argument record.
    ///
    /// The error string is caller-facing: it names the tool and the field
    /// serde objected to. Unknown tool names fail here too, with the same
    /// wording the transport uses for its routing check.
    pub fn parse(name: &str, args: Value) -> Result<Self, String> {
        if !TOOL_NAMES.contains(&name) {
            return Err(format!("unknown tool \"{name}\""));
        }
        let Value::Object(mut fields) = args else {
            return Err(format!("{name}: argument record must be a JSON object"));
        };
        fields.insert("tool".to_string(), Value::String(name.to_string()));
        serde_json::from_value(Value::Object(fields)).map_err(|err| format!("{name}: {err}"))
    }

    /// The external name of this call's tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::BuildTransaction { .. } => "buildTransaction",
            ToolCall::SignAndSendTransaction { .. } => "signAndSendTransaction",
            ToolCall::GetAccountInfo { .. } => "getAccountInfo",
            ToolCall::GetBalance { .. } => "getBalance",
            ToolCall::GetMinimumBalanceForRentExemption { .. } => {
                "getMinimumBalanceForRentExemption"
            }
            ToolCall::GetTransaction { .. } => "getTransaction",
            ToolCall::RequestAirdrop { .. } => "requestAirdrop",
        }
    }
}

/// The uniform response envelope: a textual payload and an error flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    /// The payload. JSON text for structured results, a sentence for errors.
    pub text: String,
    /// Whether `text` describes a failure.
    pub is_error: bool,
}

impl ToolResponse {
    fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes tool calls through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    endpoint_override: Option<String>,
}

/// Internal failure type: component errors plus dispatcher-level refusals
/// that have no [`ToolError`] kind (an airdrop on mainnet-beta, say).
#[derive(Debug, Error)]
enum DispatchFailure {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("{0}")]
    Refused(String),
}

impl Dispatcher {
    /// A dispatcher that resolves endpoints from cluster names.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose RPC traffic all goes to `endpoint`, whatever
    /// cluster each call names. Cluster names are still validated. Meant
    /// for tests and local validators.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint_override: Some(endpoint.into()),
        }
    }

    /// Runs one tool call to completion and folds the outcome into the
    /// uniform response envelope.
    pub async fn dispatch(&self, call: ToolCall) -> ToolResponse {
        let tool = call.name();
        match self.run(call).await {
            Ok(text) => {
                info!(tool, "tool call succeeded");
                ToolResponse::success(text)
            }
            Err(failure) => {
                info!(tool, error = %failure, "tool call failed");
                ToolResponse::error(failure.to_string())
            }
        }
    }

    async fn run(&self, call: ToolCall) -> Result<String, DispatchFailure> {
        match call {
            ToolCall::BuildTransaction {
                instructions,
                cluster,
                fee_payer,
                signer_secret_key,
            } => {
                let gateway = self.gateway_for(&cluster)?;
                let descriptors = instructions
                    .iter()
                    .map(InstructionDescriptor::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                let keypair = Keypair::from_base64(&signer_secret_key)?;

                let mut envelope = assemble(&descriptors, &fee_payer, &gateway).await?;
                sign_envelope(&mut envelope, &keypair)?;

                Ok(json!({ "transactionBase64": envelope.to_base64() }).to_string())
            }

            ToolCall::SignAndSendTransaction {
                transaction_base64,
                secret_key,
                cluster,
            } => {
                let gateway = self.gateway_for(&cluster)?;
                let mut envelope = TransactionEnvelope::from_base64(&transaction_base64)?;
                let keypair = Keypair::from_base64(&secret_key)?;
                sign_envelope(&mut envelope, &keypair)?;

                let signature = gateway.send_transaction(&envelope.encode()).await?;
                Ok(json!({ "signature": signature }).to_string())
            }

            ToolCall::GetAccountInfo { public_key, cluster } => {
                let gateway = self.gateway_for(&cluster)?;
                let address = Address::from_base58(&public_key)?;
                let info = gateway.account_info(&address).await?;
                Ok(info.unwrap_or(Value::Null).to_string())
            }

            ToolCall::GetBalance { public_key, cluster } => {
                let gateway = self.gateway_for(&cluster)?;
                let address = Address::from_base58(&public_key)?;
                let lamports = gateway.balance(&address).await?;
                Ok(format_lamports(lamports))
            }

            ToolCall::GetMinimumBalanceForRentExemption { data_size, cluster } => {
                let gateway = self.gateway_for(&cluster)?;
                let lamports = gateway.minimum_balance_for_rent_exemption(data_size).await?;
                Ok(format_lamports(lamports))
            }

            ToolCall::GetTransaction { signature, cluster } => {
                let gateway = self.gateway_for(&cluster)?;
                let parsed = gateway.transaction(&signature).await?;
                Ok(parsed.unwrap_or(Value::Null).to_string())
            }

            ToolCall::RequestAirdrop {
                public_key,
                lamports,
                cluster,
            } => {
                let resolved = Cluster::resolve(&cluster)?;
                if resolved == Cluster::MainnetBeta {
                    return Err(DispatchFailure::Refused(
                        "airdrops are not available on mainnet-beta; use devnet or testnet"
                            .to_string(),
                    ));
                }
                let gateway = self.gateway_for(&cluster)?;
                let address = Address::from_base58(&public_key)?;
                let signature = gateway.request_airdrop(&address, lamports).await?;
                Ok(signature)
            }
        }
    }

    /// Resolves the call's cluster name and binds a gateway to it, honoring
    /// the endpoint override.
    fn gateway_for(&self, cluster_name: &str) -> Result<RpcGateway, ToolError> {
        let cluster = Cluster::resolve(cluster_name)?;
        match &self.endpoint_override {
            Some(endpoint) => RpcGateway::new(endpoint.clone()),
            None => RpcGateway::for_cluster(cluster),
        }
    }
}

/// Renders a lamport amount in the dual form query tools answer with.
fn format_lamports(lamports: u64) -> String {
    let sol = lamports as f64 / LAMPORTS_PER_SOL as f64;
    format!("{sol} SOL ({lamports} lamports)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;

    fn addr(byte: u8) -> String {
        Address::from_bytes([byte; 32]).to_base58()
    }

    // An endpoint nothing listens on. Calls that reach the network against
    // it fail fast with a connect error instead of hanging.
    fn offline_dispatcher() -> Dispatcher {
        Dispatcher::with_endpoint("http://127.0.0.1:9")
    }

    #[test]
    fn parse_knows_every_tool_name() {
        let call = ToolCall::parse(
            "getBalance",
            json!({ "publicKey": addr(1), "cluster": "devnet" }),
        )
        .unwrap();
        assert_eq!(call.name(), "getBalance");
    }

    #[test]
    fn parse_rejects_unknown_tools() {
        let err = ToolCall::parse("mintNft", json!({})).unwrap_err();
        assert!(err.contains("unknown tool"), "message: {err}");
    }

    #[test]
    fn parse_rejects_non_object_arguments() {
        let err = ToolCall::parse("getBalance", json!([1, 2, 3])).unwrap_err();
        assert!(err.contains("JSON object"), "message: {err}");
    }

    #[test]
    fn parse_names_the_missing_field() {
        let err = ToolCall::parse("getBalance", json!({ "cluster": "devnet" })).unwrap_err();
        assert!(err.starts_with("getBalance:"), "message: {err}");
        assert!(err.contains("publicKey"), "message: {err}");
    }

    #[test]
    fn response_envelope_serializes_camel_case() {
        let response = ToolResponse::error("boom");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "text": "boom", "isError": true }));
    }

    #[test]
    fn format_lamports_dual_form() {
        assert_eq!(format_lamports(0), "0 SOL (0 lamports)");
        assert_eq!(format_lamports(1_500_000_000), "1.5 SOL (1500000000 lamports)");
    }

    #[tokio::test]
    async fn bad_cluster_fails_before_any_network_io() {
        let response = offline_dispatcher()
            .dispatch(ToolCall::GetBalance {
                public_key: addr(1),
                cluster: "mainnet".to_string(),
            })
            .await;
        assert!(response.is_error);
        assert!(response.text.contains("unknown cluster"), "text: {}", response.text);
    }

    #[tokio::test]
    async fn bad_fee_payer_fails_before_the_blockhash_fetch() {
        // The offline endpoint would produce a NetworkUnavailable error if
        // the dispatcher fetched a blockhash first. An address error proves
        // validation ran before I/O.
        let response = offline_dispatcher()
            .dispatch(ToolCall::BuildTransaction {
                instructions: vec![json!({
                    "type": "transfer",
                    "params": { "from": addr(1), "to": addr(2), "amount": 1.0 },
                })],
                cluster: "devnet".to_string(),
                fee_payer: "not-an-address".to_string(),
                signer_secret_key: Keypair::generate().to_base64(),
            })
            .await;
        assert!(response.is_error);
        assert!(response.text.contains("invalid address"), "text: {}", response.text);
    }

    #[tokio::test]
    async fn unknown_instruction_tag_is_reported_not_skipped() {
        let response = offline_dispatcher()
            .dispatch(ToolCall::BuildTransaction {
                instructions: vec![json!({ "type": "mintNft", "params": {} })],
                cluster: "devnet".to_string(),
                fee_payer: addr(1),
                signer_secret_key: Keypair::generate().to_base64(),
            })
            .await;
        assert!(response.is_error);
        assert!(response.text.contains("mintNft"), "text: {}", response.text);
    }

    #[tokio::test]
    async fn bad_secret_key_never_echoes_the_material() {
        use crate::assembler::compile_message;
        use crate::wire::Blockhash;

        // A structurally valid unsigned transaction, so the pipeline gets
        // as far as decoding the key.
        let message = compile_message(
            &[InstructionDescriptor::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 1.0,
            }],
            &addr(1),
            Blockhash::from_bytes([3u8; 32]),
        )
        .unwrap();
        let encoded = TransactionEnvelope::unsigned(message).to_base64();

        let bogus_key = "dGhpcyBpcyBub3QgYSByZWFsIGtleQ==";
        let response = offline_dispatcher()
            .dispatch(ToolCall::SignAndSendTransaction {
                transaction_base64: encoded,
                secret_key: bogus_key.to_string(),
                cluster: "devnet".to_string(),
            })
            .await;
        assert!(response.is_error);
        assert!(response.text.contains("invalid key material"), "text: {}", response.text);
        assert!(!response.text.contains(bogus_key), "text: {}", response.text);
    }

    #[tokio::test]
    async fn malformed_transaction_is_reported_as_such() {
        let kp = Keypair::generate();
        let response = offline_dispatcher()
            .dispatch(ToolCall::SignAndSendTransaction {
                transaction_base64: "////".to_string(),
                secret_key: kp.to_base64(),
                cluster: "devnet".to_string(),
            })
            .await;
        assert!(response.is_error);
        assert!(
            response.text.contains("malformed transaction"),
            "text: {}",
            response.text
        );
    }

    #[tokio::test]
    async fn airdrop_is_refused_on_mainnet() {
        let response = Dispatcher::new()
            .dispatch(ToolCall::RequestAirdrop {
                public_key: addr(1),
                lamports: 1_000_000_000,
                cluster: "mainnet-beta".to_string(),
            })
            .await;
        assert!(response.is_error);
        assert!(
            response.text.contains("not available on mainnet-beta"),
            "text: {}",
            response.text
        );
    }
}
