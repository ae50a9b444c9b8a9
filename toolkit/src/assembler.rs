//! # Transaction Assembly
//!
//! Turns caller-supplied instruction descriptors into an unsigned
//! [`TransactionEnvelope`].
//!
//! Assembly is split in two. [`compile_message`] is pure: it validates every
//! participant, builds the deduplicated account table, and compiles
//! instructions against it, all without touching the network. [`assemble`]
//! wraps it with the single network round-trip that fetches a recent
//! blockhash. Keeping the pure part separate is what makes the account
//! ordering rules testable without an endpoint.
//!
//! ## Account table ordering
//!
//! The table is ordered by privilege class: fee payer first, then writable
//! signers, read-only signers, writable non-signers, read-only non-signers.
//! Within a class, accounts keep the order of their first appearance across
//! the instruction list. An address that appears in several instructions
//! gets the union of its privileges, so a read-only mention never demotes
//! an account something else needs to write.

use tracing::debug;

use crate::error::ToolError;
use crate::instruction::{Instruction, InstructionDescriptor};
use crate::keys::Address;
use crate::rpc::RpcGateway;
use crate::wire::{Blockhash, CompiledInstruction, Message, MessageHeader, TransactionEnvelope};

// ---------------------------------------------------------------------------
// Account Collection
// ---------------------------------------------------------------------------

/// One account's accumulated privileges across the whole transaction.
#[derive(Debug, Clone, Copy)]
struct CollectedAccount {
    address: Address,
    is_signer: bool,
    is_writable: bool,
}

/// Accumulates accounts in first-appearance order, merging privileges when
/// the same address shows up more than once.
#[derive(Debug, Default)]
struct AccountCollector {
    accounts: Vec<CollectedAccount>,
}

impl AccountCollector {
    fn add(&mut self, address: Address, is_signer: bool, is_writable: bool) {
        if let Some(existing) = self
            .accounts
            .iter_mut()
            .find(|entry| entry.address == address)
        {
            existing.is_signer |= is_signer;
            existing.is_writable |= is_writable;
        } else {
            self.accounts.push(CollectedAccount {
                address,
                is_signer,
                is_writable,
            });
        }
    }

    /// Flattens into the final table order and its header counts.
    ///
    /// Four stable passes over the first-appearance list, one per privilege
    /// class. The fee payer was added first and is a writable signer, so it
    /// comes out at index zero without special handling.
    fn into_table(self) -> (Vec<Address>, MessageHeader) {
        let mut keys = Vec::with_capacity(self.accounts.len());
        let mut num_required_signatures = 0u8;
        let mut num_readonly_signed_accounts = 0u8;
        let mut num_readonly_unsigned_accounts = 0u8;

        for entry in self.accounts.iter().filter(|a| a.is_signer && a.is_writable) {
            keys.push(entry.address);
            num_required_signatures += 1;
        }
        for entry in self.accounts.iter().filter(|a| a.is_signer && !a.is_writable) {
            keys.push(entry.address);
            num_required_signatures += 1;
            num_readonly_signed_accounts += 1;
        }
        for entry in self.accounts.iter().filter(|a| !a.is_signer && a.is_writable) {
            keys.push(entry.address);
        }
        for entry in self.accounts.iter().filter(|a| !a.is_signer && !a.is_writable) {
            keys.push(entry.address);
            num_readonly_unsigned_accounts += 1;
        }

        (
            keys,
            MessageHeader {
                num_required_signatures,
                num_readonly_signed_accounts,
                num_readonly_unsigned_accounts,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// A fully validated and compiled message, waiting only for its blockhash.
///
/// Everything fallible about compilation happens while building this value.
/// Attaching the blockhash afterwards cannot fail, which is what lets
/// [`assemble`] validate every participant before paying for the network
/// round-trip.
#[derive(Debug, Clone)]
pub struct PreparedMessage {
    header: MessageHeader,
    account_keys: Vec<Address>,
    instructions: Vec<CompiledInstruction>,
}

impl PreparedMessage {
    /// Attaches the freshness token, producing the canonical message.
    pub fn into_message(self, recent_blockhash: Blockhash) -> Message {
        Message {
            header: self.header,
            account_keys: self.account_keys,
            recent_blockhash,
            instructions: self.instructions,
        }
    }
}

/// Validates descriptors and compiles them against the account table.
///
/// Fails fast: every address in every descriptor is decoded before any
/// table is built, so a typo in the last instruction surfaces without
/// side effects. Instruction order is preserved exactly.
pub fn prepare_message(
    descriptors: &[InstructionDescriptor],
    fee_payer: &str,
) -> Result<PreparedMessage, ToolError> {
    let fee_payer = Address::from_base58(fee_payer)?;

    let instructions: Vec<Instruction> = descriptors
        .iter()
        .map(InstructionDescriptor::compile)
        .collect::<Result<_, _>>()?;

    let mut collector = AccountCollector::default();
    // The fee payer signs and pays, whatever else it does.
    collector.add(fee_payer, true, true);
    for ix in &instructions {
        for meta in &ix.accounts {
            collector.add(meta.address, meta.is_signer, meta.is_writable);
        }
        // Programs are executed, not mutated, and never sign.
        collector.add(ix.program_id, false, false);
    }

    let (account_keys, header) = collector.into_table();
    if account_keys.len() > usize::from(u8::MAX) + 1 {
        return Err(ToolError::MalformedTransaction(format!(
            "account table has {} entries, more than instruction indexes can address",
            account_keys.len()
        )));
    }

    // Every instruction address was just added to the collector, so these
    // lookups cannot miss once the size check above has passed.
    let index_of = |address: &Address| -> Result<u8, ToolError> {
        account_keys
            .iter()
            .position(|key| key == address)
            .map(|i| i as u8)
            .ok_or_else(|| {
                ToolError::MalformedTransaction("account missing from compiled table".to_string())
            })
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in &instructions {
        let accounts = ix
            .accounts
            .iter()
            .map(|m| index_of(&m.address))
            .collect::<Result<_, _>>()?;
        compiled.push(CompiledInstruction {
            program_id_index: index_of(&ix.program_id)?,
            accounts,
            data: ix.data.clone(),
        });
    }

    Ok(PreparedMessage {
        header,
        account_keys,
        instructions: compiled,
    })
}

/// Compiles descriptors into a canonical [`Message`] against a known
/// blockhash. The pure composition of [`prepare_message`] and
/// [`PreparedMessage::into_message`].
pub fn compile_message(
    descriptors: &[InstructionDescriptor],
    fee_payer: &str,
    recent_blockhash: Blockhash,
) -> Result<Message, ToolError> {
    Ok(prepare_message(descriptors, fee_payer)?.into_message(recent_blockhash))
}

/// Assembles an unsigned transaction, fetching a fresh blockhash from the
/// gateway.
///
/// Participant validation runs to completion before the blockhash fetch,
/// the pipeline's only network round-trip before send. A bad address never
/// costs an RPC call.
pub async fn assemble(
    descriptors: &[InstructionDescriptor],
    fee_payer: &str,
    gateway: &RpcGateway,
) -> Result<TransactionEnvelope, ToolError> {
    let prepared = prepare_message(descriptors, fee_payer)?;
    let blockhash = gateway.latest_blockhash().await?;
    let message = prepared.into_message(blockhash);
    debug!(
        accounts = message.account_keys.len(),
        instructions = message.instructions.len(),
        signers = message.header.num_required_signatures,
        "assembled unsigned transaction"
    );
    Ok(TransactionEnvelope::unsigned(message))
}
