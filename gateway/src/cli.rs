//! # CLI Interface
//!
//! Defines the command-line argument structure for `helio-gateway` using
//! `clap` derive. Supports four subcommands: `serve`, `call`, `keygen`,
//! and `version`.

use clap::{Parser, Subcommand};
use helio_toolkit::config::{DEFAULT_HTTP_PORT, DEFAULT_METRICS_PORT};

/// HELIO tool gateway.
///
/// Hosts the Solana transaction toolkit behind an HTTP tool-calling API,
/// exposes Prometheus metrics, and offers one-shot subcommands for local
/// tool invocation and keypair generation.
#[derive(Parser, Debug)]
#[command(
    name = "helio-gateway",
    about = "HELIO Solana tool gateway",
    version,
    propagate_version = true
)]
pub struct HelioGatewayCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the gateway binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP tool server.
    Serve(ServeArgs),
    /// Invoke a single tool from the command line and print its payload.
    Call(CallArgs),
    /// Generate a fresh Ed25519 keypair and print it to stdout.
    Keygen,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port for the tool-calling HTTP API.
    #[arg(long, env = "HELIO_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "HELIO_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "HELIO_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Override the upstream RPC endpoint for every cluster name.
    ///
    /// Intended for local test validators. When omitted, each call's
    /// `cluster` argument resolves to the matching public endpoint.
    #[arg(long, env = "HELIO_RPC_ENDPOINT")]
    pub rpc_endpoint: Option<String>,
}

/// Arguments for the `call` subcommand.
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Tool name, e.g. `getBalance`.
    pub tool: String,

    /// Tool arguments as a JSON object string.
    #[arg(default_value = "{}")]
    pub args: String,

    /// Override the upstream RPC endpoint for every cluster name.
    #[arg(long, env = "HELIO_RPC_ENDPOINT")]
    pub rpc_endpoint: Option<String>,
}
