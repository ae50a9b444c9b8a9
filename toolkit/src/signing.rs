//! # Signing Engine
//!
//! Applies signatures to a [`TransactionEnvelope`], in place.
//!
//! The bytes being signed are the message's canonical serialization, which
//! does not include the signature slots. Adding a second signature can
//! therefore never invalidate the first. Signing is positional: the
//! signature lands in the slot whose index matches the signer's position in
//! the required-signer region of the account table.
//!
//! A key whose derived address is not a required signer is refused with
//! [`ToolError::SignerMismatch`]. Accepting it would produce a transaction
//! the network rejects anyway, with a far worse error message.

use tracing::debug;

use crate::error::ToolError;
use crate::keys::Keypair;
use crate::wire::TransactionEnvelope;

/// Signs the envelope's message with `keypair`, filling the signer's slot.
///
/// Idempotent per signer: re-signing with the same key overwrites its slot
/// with an identical signature rather than adding a duplicate. Other slots
/// are untouched.
pub fn sign_envelope(
    envelope: &mut TransactionEnvelope,
    keypair: &Keypair,
) -> Result<(), ToolError> {
    let address = keypair.address();
    let slot = envelope
        .required_signers()
        .iter()
        .position(|signer| *signer == address)
        .ok_or_else(|| ToolError::SignerMismatch {
            address: address.to_base58(),
        })?;

    let message_bytes = envelope.message.serialize();
    envelope.signatures[slot] = keypair.sign(&message_bytes);
    debug!(signer = %address, slot, "applied signature");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{Address, Signature};
    use crate::wire::{Blockhash, CompiledInstruction, Message, MessageHeader};

    /// A two-signer message whose signing keys are the given keypairs.
    fn two_signer_envelope(a: &Keypair, b: &Keypair) -> TransactionEnvelope {
        let program = Address::from_bytes([0u8; 32]);
        TransactionEnvelope::unsigned(Message {
            header: MessageHeader {
                num_required_signatures: 2,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![a.address(), b.address(), program],
            recent_blockhash: Blockhash::from_bytes([5u8; 32]),
            instructions: vec![CompiledInstruction {
                program_id_index: 2,
                accounts: vec![0, 1],
                data: vec![2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0],
            }],
        })
    }

    #[test]
    fn signs_into_the_matching_slot() {
        let (a, b) = (Keypair::generate(), Keypair::generate());
        let mut envelope = two_signer_envelope(&a, &b);

        sign_envelope(&mut envelope, &b).unwrap();

        assert!(envelope.signatures[0].is_placeholder());
        assert!(!envelope.signatures[1].is_placeholder());
        assert!(!envelope.is_fully_signed());

        sign_envelope(&mut envelope, &a).unwrap();
        assert!(envelope.is_fully_signed());
    }

    #[test]
    fn rejects_a_key_that_is_not_a_required_signer() {
        let (a, b) = (Keypair::generate(), Keypair::generate());
        let stranger = Keypair::generate();
        let mut envelope = two_signer_envelope(&a, &b);

        match sign_envelope(&mut envelope, &stranger) {
            Err(ToolError::SignerMismatch { address }) => {
                assert_eq!(address, stranger.address().to_base58());
            }
            other => panic!("expected SignerMismatch, got {other:?}"),
        }
        // A refused signer must leave the envelope untouched.
        assert!(envelope.signatures.iter().all(Signature::is_placeholder));
    }

    #[test]
    fn re_signing_is_idempotent() {
        let (a, b) = (Keypair::generate(), Keypair::generate());
        let mut envelope = two_signer_envelope(&a, &b);

        sign_envelope(&mut envelope, &a).unwrap();
        let first = envelope.signatures[0];
        sign_envelope(&mut envelope, &a).unwrap();

        assert_eq!(envelope.signatures[0], first);
        assert_eq!(envelope.signatures.len(), 2);
    }

    #[test]
    fn later_signatures_do_not_invalidate_earlier_ones() {
        let (a, b) = (Keypair::generate(), Keypair::generate());
        let mut envelope = two_signer_envelope(&a, &b);

        sign_envelope(&mut envelope, &a).unwrap();
        let a_sig = envelope.signatures[0];
        sign_envelope(&mut envelope, &b).unwrap();

        // The message bytes are signature-independent, so a's signature is
        // byte-identical before and after b signs.
        assert_eq!(envelope.signatures[0], a_sig);
    }

    #[test]
    fn signature_verifies_against_the_message_bytes() {
        use ed25519_dalek::{Verifier, VerifyingKey};

        let (a, b) = (Keypair::generate(), Keypair::generate());
        let mut envelope = two_signer_envelope(&a, &b);
        sign_envelope(&mut envelope, &a).unwrap();

        let verifying_key = VerifyingKey::from_bytes(a.address().as_bytes()).unwrap();
        let sig = ed25519_dalek::Signature::from_bytes(envelope.signatures[0].as_bytes());
        assert!(verifying_key
            .verify(&envelope.message.serialize(), &sig)
            .is_ok());
    }

    #[test]
    fn signing_survives_a_codec_round_trip() {
        let (a, b) = (Keypair::generate(), Keypair::generate());
        let mut envelope = two_signer_envelope(&a, &b);
        sign_envelope(&mut envelope, &a).unwrap();

        // Decode a partially signed transaction and finish signing it, the
        // relay path in miniature.
        let mut restored = TransactionEnvelope::from_base64(&envelope.to_base64()).unwrap();
        assert_eq!(restored, envelope);
        sign_envelope(&mut restored, &b).unwrap();
        assert!(restored.is_fully_signed());
    }
}
