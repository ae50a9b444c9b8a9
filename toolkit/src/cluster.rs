//! # Cluster Resolution
//!
//! Maps the three public Solana networks to their JSON-RPC endpoints.
//!
//! The set is closed on purpose. There is no "custom" variant and no
//! URL passthrough: a tool argument either names one of the three known
//! networks exactly, or the call fails before any I/O happens. Accepting
//! near-misses ("mainnet", "main", "prod") is how transactions end up on
//! the wrong network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{DEVNET_RPC_URL, MAINNET_BETA_RPC_URL, TESTNET_RPC_URL};
use crate::error::ToolError;

/// One of the three public Solana clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    /// The production network. Lamports here are money.
    MainnetBeta,
    /// The staging network used for validator release testing.
    Testnet,
    /// The development network. State resets happen; airdrops are free.
    Devnet,
}

impl Cluster {
    /// Resolves a cluster from its canonical name.
    ///
    /// Accepts exactly `"mainnet-beta"`, `"testnet"`, and `"devnet"`.
    /// Anything else — including case variants and abbreviations — fails
    /// with [`ToolError::InvalidCluster`].
    pub fn resolve(name: &str) -> Result<Self, ToolError> {
        match name {
            "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "testnet" => Ok(Cluster::Testnet),
            "devnet" => Ok(Cluster::Devnet),
            other => Err(ToolError::InvalidCluster(other.to_string())),
        }
    }

    /// The fixed HTTPS JSON-RPC endpoint for this cluster.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => MAINNET_BETA_RPC_URL,
            Cluster::Testnet => TESTNET_RPC_URL,
            Cluster::Devnet => DEVNET_RPC_URL,
        }
    }

    /// The canonical name, as accepted by [`resolve`](Self::resolve).
    pub fn name(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Testnet => "testnet",
            Cluster::Devnet => "devnet",
        }
    }
}

impl FromStr for Cluster {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cluster::resolve(s)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
