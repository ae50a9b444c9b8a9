//! # Toolkit Configuration & Constants
//!
//! Every magic number in HELIO lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these are dictated by the Solana wire format and cannot be
//! changed without breaking interop. The rest (timeouts, ports) are ours.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Cluster Endpoints
// ---------------------------------------------------------------------------

/// Mainnet-beta — the real deal. Mistakes here cost real money.
pub const MAINNET_BETA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Testnet — where the core team breaks things on purpose and calls it "testing."
pub const TESTNET_RPC_URL: &str = "https://api.testnet.solana.com";

/// Devnet — the wild west. Airdrops are free, nothing is permanent.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

// ---------------------------------------------------------------------------
// Denominations
// ---------------------------------------------------------------------------

/// One SOL is exactly one billion lamports. This ratio is fixed by the
/// network; it does not float, round, or negotiate.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 public key length. Account addresses are raw public keys.
pub const ADDRESS_LENGTH: usize = 32;

/// Ed25519 seed length. The first half of a secret key blob.
pub const SEED_LENGTH: usize = 32;

/// Serialized secret key blob length: 32-byte seed followed by the 32-byte
/// public key. The redundant public half exists so a decoder can detect
/// corrupted or mismatched key material instead of silently signing with
/// the wrong identity.
pub const SECRET_KEY_BLOB_LENGTH: usize = 64;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Recent blockhash length. A blockhash is a 32-byte digest used as the
/// transaction freshness token.
pub const BLOCKHASH_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

/// The system program. Owns native lamport transfers and account creation.
/// Base58 for thirty-two zero bytes, which is why it looks like a test
/// fixture. It isn't.
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

/// System program instruction discriminant for a native transfer,
/// little-endian u32 on the wire.
pub const SYSTEM_TRANSFER_DISCRIMINANT: u32 = 2;

// ---------------------------------------------------------------------------
// RPC Client
// ---------------------------------------------------------------------------

/// Upstream JSON-RPC version string. There is no 3.0.
pub const JSONRPC_VERSION: &str = "2.0";

/// Hard timeout for every upstream RPC call. Ten seconds is generous for a
/// JSON-RPC round-trip; past that the cluster is having a bad day and the
/// caller deserves to know.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Gateway Defaults
// ---------------------------------------------------------------------------

/// Default port for the tool-hosting HTTP API.
pub const DEFAULT_HTTP_PORT: u16 = 8970;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 8971;
