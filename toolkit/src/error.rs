//! Error types for the HELIO toolkit.
//!
//! Every fallible operation in the pipeline returns a [`ToolError`]. This
//! enum is exhaustive over the failure modes of assembly, signing, codec,
//! and upstream RPC work.
//!
//! Absence is not failure: a query for an account or transaction that does
//! not exist resolves to `Ok(None)`, never to a variant here.
//!
//! None of these variants carry secret key material, and none ever will.
//! Error strings travel into tool responses and logs verbatim.

use thiserror::Error;

/// Errors that can occur across the toolkit pipeline.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The cluster name is not one of the three recognized networks.
    #[error("unknown cluster \"{0}\": expected mainnet-beta, testnet, or devnet")]
    InvalidCluster(String),

    /// An address string did not decode to exactly 32 base58 bytes.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Secret key material was the wrong length or internally inconsistent.
    /// Intentionally vague about *why* — leaking details about key material
    /// through error messages is a classic footgun.
    #[error("invalid key material: wrong length or mismatched public key")]
    InvalidKeyMaterial,

    /// A SOL amount that cannot be converted to lamports.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An instruction carried a type tag the toolkit does not implement.
    #[error("unsupported instruction type \"{0}\"")]
    UnsupportedInstruction(String),

    /// The signing key's address is not among the transaction's required
    /// signers.
    #[error("signer {address} is not a required signer of this transaction")]
    SignerMismatch {
        /// Base58 address derived from the offered key.
        address: String,
    },

    /// A serialized transaction failed structural validation on decode.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// The upstream endpoint could not be reached, timed out, or returned
    /// an unusable reply.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The upstream endpoint returned a well-formed JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    RpcError {
        /// Numeric JSON-RPC error code.
        code: i64,
        /// Human-readable message from the endpoint.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_material_error_is_opaque() {
        // The Display form must not invite interpolation of key bytes.
        let msg = ToolError::InvalidKeyMaterial.to_string();
        assert_eq!(
            msg,
            "invalid key material: wrong length or mismatched public key"
        );
    }

    #[test]
    fn rpc_error_carries_code_and_message() {
        let err = ToolError::RpcError {
            code: -32002,
            message: "Blockhash not found".into(),
        };
        assert_eq!(err.to_string(), "rpc error -32002: Blockhash not found");
    }

    #[test]
    fn cluster_error_names_the_valid_set() {
        let msg = ToolError::InvalidCluster("mainnet".into()).to_string();
        assert!(msg.contains("mainnet-beta"));
        assert!(msg.contains("devnet"));
    }
}
