//! # Instruction Descriptors
//!
//! The caller-facing instruction vocabulary and its compilation into
//! program-level instructions.
//!
//! A descriptor arrives as a JSON object with a `type` tag and its fields
//! under `params`. Dispatch over the tag is total and explicit: a tag this
//! module does not know fails
//! with [`ToolError::UnsupportedInstruction`]. Nothing is ever silently
//! skipped — a transaction that drops one of its instructions on the floor
//! is worse than no transaction at all.
//!
//! Instruction order is the caller's to choose and is preserved exactly
//! through compilation and assembly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{LAMPORTS_PER_SOL, SYSTEM_PROGRAM_ID, SYSTEM_TRANSFER_DISCRIMINANT};
use crate::error::ToolError;
use crate::keys::Address;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// One caller-supplied instruction, tagged by `type` with its fields under
/// `params`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum InstructionDescriptor {
    /// A native lamport transfer via the system program.
    Transfer {
        /// Sender address (base58). Must sign the transaction.
        from: String,
        /// Recipient address (base58).
        to: String,
        /// Amount in SOL. Converted to lamports at the fixed rate.
        amount: f64,
    },
}

impl InstructionDescriptor {
    /// Parses a descriptor from a raw JSON value.
    ///
    /// The tag is matched explicitly so that an unknown `type` surfaces as
    /// [`ToolError::UnsupportedInstruction`] carrying the offending tag,
    /// and field-level problems map to the error kind of the field that is
    /// wrong, not to a generic deserialization message.
    pub fn from_value(value: &Value) -> Result<Self, ToolError> {
        let Some(tag) = value.get("type").and_then(Value::as_str) else {
            return Err(ToolError::UnsupportedInstruction(
                "(missing type tag)".to_string(),
            ));
        };

        match tag {
            "transfer" => {
                // A missing or non-object `params` reads as every field
                // missing, so the first required field reports it.
                let params = value.get("params").unwrap_or(&Value::Null);
                let from = required_str(params, "from")?;
                let to = required_str(params, "to")?;
                let amount = params.get("amount").and_then(Value::as_f64).ok_or_else(|| {
                    ToolError::InvalidAmount("transfer.amount: expected a number".to_string())
                })?;
                Ok(InstructionDescriptor::Transfer {
                    from: from.to_string(),
                    to: to.to_string(),
                    amount,
                })
            }
            other => Err(ToolError::UnsupportedInstruction(other.to_string())),
        }
    }

    /// Compiles this descriptor into a program-level [`Instruction`].
    ///
    /// Address decoding happens here, which is what lets assembly fail fast
    /// on a bad participant before any network round-trip.
    pub fn compile(&self) -> Result<Instruction, ToolError> {
        match self {
            InstructionDescriptor::Transfer { from, to, amount } => {
                let from = Address::from_base58(from)?;
                let to = Address::from_base58(to)?;
                let lamports = lamports_from_sol(*amount)?;
                Ok(transfer_instruction(from, to, lamports))
            }
        }
    }
}

fn required_str<'v>(value: &'v Value, field: &str) -> Result<&'v str, ToolError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidAddress(format!("transfer.{field}: expected a base58 string")))
}

// ---------------------------------------------------------------------------
// Amount Conversion
// ---------------------------------------------------------------------------

/// Converts a fractional SOL amount into lamports.
///
/// Rejects negative, non-finite, and overflowing amounts. Rounds to the
/// nearest lamport — a lamport is one billionth of a SOL, so the rounding
/// error is bounded by the caller's f64 precision, not ours.
pub fn lamports_from_sol(sol: f64) -> Result<u64, ToolError> {
    if !sol.is_finite() {
        return Err(ToolError::InvalidAmount(format!(
            "amount must be finite, got {sol}"
        )));
    }
    if sol < 0.0 {
        return Err(ToolError::InvalidAmount(format!(
            "amount must be non-negative, got {sol}"
        )));
    }
    let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
    // u64::MAX as f64 rounds up to 2^64, so >= catches every out-of-range value.
    if lamports >= u64::MAX as f64 {
        return Err(ToolError::InvalidAmount(format!(
            "amount {sol} SOL overflows the lamport range"
        )));
    }
    Ok(lamports as u64)
}

// ---------------------------------------------------------------------------
// Program-Level Instructions
// ---------------------------------------------------------------------------

/// How one account participates in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    /// The account's address.
    pub address: Address,
    /// Whether the account must sign the transaction.
    pub is_signer: bool,
    /// Whether the instruction may mutate the account.
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account that must sign.
    pub fn writable_signer(address: Address) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable: true,
        }
    }

    /// A writable account that does not sign.
    pub fn writable(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: true,
        }
    }
}

/// A fully-resolved instruction: target program, participating accounts,
/// and opaque data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The program that executes this instruction.
    pub program_id: Address,
    /// Participating accounts, in the order the program expects them.
    pub accounts: Vec<AccountMeta>,
    /// Program-specific data bytes.
    pub data: Vec<u8>,
}

/// Builds a system-program transfer moving `lamports` from `from` to `to`.
///
/// Wire data is the little-endian u32 transfer discriminant followed by the
/// little-endian u64 lamport amount.
pub fn transfer_instruction(from: Address, to: Address, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_DISCRIMINANT.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: system_program_id(),
        accounts: vec![AccountMeta::writable_signer(from), AccountMeta::writable(to)],
        data,
    }
}

/// The system program's address: thirty-two zero bytes.
pub fn system_program_id() -> Address {
    Address::from_bytes([0u8; 32])
}
