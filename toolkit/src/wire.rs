//! # Transaction Wire Codec
//!
//! The network-canonical compact byte layout for messages and transactions,
//! plus the base64 transport form.
//!
//! Layout:
//!
//! ```text
//! transaction = compact-u16 signature count
//!            || signatures (64 bytes each)
//!            || message
//! message     = header (3 bytes)
//!            || compact-u16 account count || account keys (32 bytes each)
//!            || recent blockhash (32 bytes)
//!            || compact-u16 instruction count || instructions
//! instruction = program_id_index (u8)
//!            || compact-u16 account-index count || indexes (u8 each)
//!            || compact-u16 data length || data bytes
//! ```
//!
//! Decoding is strict. Every length is checked against the remaining bytes,
//! compact-u16 values must be minimally encoded, the signature count must
//! agree with the header, and trailing bytes are rejected. A transaction
//! that decodes is a transaction that re-encodes to the same bytes.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::config::{ADDRESS_LENGTH, BLOCKHASH_LENGTH, SIGNATURE_LENGTH};
use crate::error::ToolError;
use crate::keys::{Address, Signature};

// ---------------------------------------------------------------------------
// Blockhash
// ---------------------------------------------------------------------------

/// A 32-byte recent blockhash, the transaction freshness token.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Blockhash([u8; BLOCKHASH_LENGTH]);

impl Blockhash {
    /// Wraps raw bytes.
    pub fn from_bytes(bytes: [u8; BLOCKHASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parses a base58 blockhash. `None` when the input is not base58 or
    /// not exactly 32 bytes.
    pub fn from_base58(s: &str) -> Option<Self> {
        let bytes = bs58::decode(s).into_vec().ok()?;
        let arr: [u8; BLOCKHASH_LENGTH] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; BLOCKHASH_LENGTH] {
        &self.0
    }

    /// Base58 representation, the form the RPC layer speaks.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({})", self.to_base58())
    }
}

// ---------------------------------------------------------------------------
// Compact-u16
// ---------------------------------------------------------------------------

/// Appends the compact-u16 encoding of `value`: 7 bits per byte, high bit
/// as continuation, little-end first. At most 3 bytes.
pub fn encode_compact_u16(value: u16, out: &mut Vec<u8>) {
    let mut rem = value;
    loop {
        let byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Reads a compact-u16 at `*cursor`, advancing the cursor.
///
/// Rejects truncation, encodings longer than 3 bytes, values past
/// `u16::MAX`, and non-minimal encodings (a continuation followed by a
/// zero byte would alias a shorter encoding).
pub fn decode_compact_u16(bytes: &[u8], cursor: &mut usize) -> Result<u16, ToolError> {
    let mut value: u32 = 0;
    for i in 0..3u32 {
        let byte = *bytes
            .get(*cursor)
            .ok_or_else(|| malformed("truncated compact-u16"))?;
        *cursor += 1;
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(malformed("non-minimal compact-u16 encoding"));
            }
            if value > u32::from(u16::MAX) {
                return Err(malformed("compact-u16 value out of range"));
            }
            return Ok(value as u16);
        }
    }
    Err(malformed("compact-u16 longer than 3 bytes"))
}

fn malformed(reason: &str) -> ToolError {
    ToolError::MalformedTransaction(reason.to_string())
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The three-byte message header: how many account keys must sign, and how
/// many keys at the tail of each region are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Number of leading account keys that must provide signatures.
    pub num_required_signatures: u8,
    /// Of the signing keys, how many (at the end of that region) are read-only.
    pub num_readonly_signed_accounts: u8,
    /// Of the non-signing keys, how many (at the end) are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

/// One instruction compiled against the message's account table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index of the program's address in the account table.
    pub program_id_index: u8,
    /// Indexes into the account table, in program-defined order.
    pub accounts: Vec<u8>,
    /// Program-specific data bytes.
    pub data: Vec<u8>,
}

/// The canonical transaction message: what actually gets signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Signature and privilege layout of the account table.
    pub header: MessageHeader,
    /// Deduplicated account table, ordered fee payer first, then by
    /// descending privilege.
    pub account_keys: Vec<Address>,
    /// The freshness token fetched at assembly time.
    pub recent_blockhash: Blockhash,
    /// Compiled instructions, in caller order.
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Serializes the message into its canonical bytes.
    ///
    /// These are the bytes every signer signs. Signatures never feed into
    /// them, so the output is identical however many signatures the
    /// surrounding envelope carries.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size_hint());

        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_compact_u16(self.account_keys.len() as u16, &mut out);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }

        out.extend_from_slice(self.recent_blockhash.as_bytes());

        encode_compact_u16(self.instructions.len() as u16, &mut out);
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_compact_u16(ix.accounts.len() as u16, &mut out);
            out.extend_from_slice(&ix.accounts);
            encode_compact_u16(ix.data.len() as u16, &mut out);
            out.extend_from_slice(&ix.data);
        }

        out
    }

    /// Parses a message starting at `*cursor`, advancing the cursor past it.
    pub fn deserialize(bytes: &[u8], cursor: &mut usize) -> Result<Self, ToolError> {
        let header = MessageHeader {
            num_required_signatures: read_u8(bytes, cursor, "message header")?,
            num_readonly_signed_accounts: read_u8(bytes, cursor, "message header")?,
            num_readonly_unsigned_accounts: read_u8(bytes, cursor, "message header")?,
        };

        let key_count = decode_compact_u16(bytes, cursor)? as usize;
        if usize::from(header.num_required_signatures) > key_count {
            return Err(malformed("required signature count exceeds account count"));
        }
        let mut account_keys = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            let chunk = read_array::<ADDRESS_LENGTH>(bytes, cursor, "account key")?;
            account_keys.push(Address::from_bytes(chunk));
        }

        let recent_blockhash =
            Blockhash::from_bytes(read_array::<BLOCKHASH_LENGTH>(bytes, cursor, "blockhash")?);

        let ix_count = decode_compact_u16(bytes, cursor)? as usize;
        let mut instructions = Vec::with_capacity(ix_count);
        for _ in 0..ix_count {
            let program_id_index = read_u8(bytes, cursor, "program id index")?;
            if usize::from(program_id_index) >= key_count {
                return Err(malformed("program id index out of range"));
            }

            let account_count = decode_compact_u16(bytes, cursor)? as usize;
            let accounts = read_slice(bytes, cursor, account_count, "instruction accounts")?;
            if accounts.iter().any(|&i| usize::from(i) >= key_count) {
                return Err(malformed("instruction account index out of range"));
            }

            let data_len = decode_compact_u16(bytes, cursor)? as usize;
            let data = read_slice(bytes, cursor, data_len, "instruction data")?;

            instructions.push(CompiledInstruction {
                program_id_index,
                accounts: accounts.to_vec(),
                data: data.to_vec(),
            });
        }

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    fn serialized_size_hint(&self) -> usize {
        3 + 3
            + self.account_keys.len() * ADDRESS_LENGTH
            + BLOCKHASH_LENGTH
            + self
                .instructions
                .iter()
                .map(|ix| 1 + 3 + ix.accounts.len() + 3 + ix.data.len())
                .sum::<usize>()
    }
}

fn read_u8(bytes: &[u8], cursor: &mut usize, what: &str) -> Result<u8, ToolError> {
    let byte = *bytes
        .get(*cursor)
        .ok_or_else(|| malformed(&format!("truncated {what}")))?;
    *cursor += 1;
    Ok(byte)
}

fn read_array<const N: usize>(
    bytes: &[u8],
    cursor: &mut usize,
    what: &str,
) -> Result<[u8; N], ToolError> {
    let slice = read_slice(bytes, cursor, N, what)?;
    let mut arr = [0u8; N];
    arr.copy_from_slice(slice);
    Ok(arr)
}

fn read_slice<'b>(
    bytes: &'b [u8],
    cursor: &mut usize,
    len: usize,
    what: &str,
) -> Result<&'b [u8], ToolError> {
    let end = cursor
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| malformed(&format!("truncated {what}")))?;
    let slice = &bytes[*cursor..end];
    *cursor = end;
    Ok(slice)
}

// ---------------------------------------------------------------------------
// Transaction Envelope
// ---------------------------------------------------------------------------

/// A transaction in flight: positional signature slots plus the message.
///
/// Slot `i` belongs to account key `i`. Unsigned slots hold the all-zero
/// placeholder so the wire form always carries exactly
/// `num_required_signatures` signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    /// One slot per required signer, placeholder until signed.
    pub signatures: Vec<Signature>,
    /// The canonical message.
    pub message: Message,
}

impl TransactionEnvelope {
    /// Wraps a message with the right number of placeholder signatures.
    pub fn unsigned(message: Message) -> Self {
        let slots = usize::from(message.header.num_required_signatures);
        Self {
            signatures: vec![Signature::placeholder(); slots],
            message,
        }
    }

    /// The account keys that must sign, in slot order.
    pub fn required_signers(&self) -> &[Address] {
        let n = usize::from(self.message.header.num_required_signatures);
        &self.message.account_keys[..n]
    }

    /// Whether every required-signer slot holds a real signature.
    pub fn is_fully_signed(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.iter().all(|sig| !sig.is_placeholder())
    }

    /// Serializes to the canonical wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let message_bytes = self.message.serialize();
        let mut out =
            Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_LENGTH + message_bytes.len());
        encode_compact_u16(self.signatures.len() as u16, &mut out);
        for sig in &self.signatures {
            out.extend_from_slice(sig.as_bytes());
        }
        out.extend_from_slice(&message_bytes);
        out
    }

    /// Parses wire bytes back into an envelope.
    ///
    /// Fails with [`ToolError::MalformedTransaction`] on any structural
    /// inconsistency, including a signature count that disagrees with the
    /// message header and bytes left over after the message.
    pub fn decode(bytes: &[u8]) -> Result<Self, ToolError> {
        let mut cursor = 0usize;

        let sig_count = decode_compact_u16(bytes, &mut cursor)? as usize;
        let mut signatures = Vec::with_capacity(sig_count);
        for _ in 0..sig_count {
            let chunk = read_array::<SIGNATURE_LENGTH>(bytes, &mut cursor, "signature")?;
            signatures.push(Signature::from_bytes(chunk));
        }

        let message = Message::deserialize(bytes, &mut cursor)?;

        if sig_count != usize::from(message.header.num_required_signatures) {
            return Err(malformed(
                "signature count disagrees with the message header",
            ));
        }
        if cursor != bytes.len() {
            return Err(malformed("trailing bytes after message"));
        }

        Ok(Self {
            signatures,
            message,
        })
    }

    /// The base64 transport form of [`encode`](Self::encode).
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.encode())
    }

    /// Parses the base64 transport form.
    pub fn from_base64(encoded: &str) -> Result<Self, ToolError> {
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(|_| malformed("transaction is not valid base64"))?;
        Self::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;

    fn sample_message(num_signers: u8) -> Message {
        let keys: Vec<Address> = (0..4u8).map(|i| Address::from_bytes([i + 1; 32])).collect();
        Message {
            header: MessageHeader {
                num_required_signatures: num_signers,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: keys,
            recent_blockhash: Blockhash::from_bytes([9u8; 32]),
            instructions: vec![CompiledInstruction {
                program_id_index: 3,
                accounts: vec![0, 1],
                data: vec![2, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8],
            }],
        }
    }

    // -- compact-u16 ---------------------------------------------------------

    #[test]
    fn compact_u16_edge_values_round_trip() {
        for value in [0u16, 1, 0x7f, 0x80, 0x3fff, 0x4000, u16::MAX] {
            let mut buf = Vec::new();
            encode_compact_u16(value, &mut buf);
            let mut cursor = 0;
            assert_eq!(decode_compact_u16(&buf, &mut cursor).unwrap(), value);
            assert_eq!(cursor, buf.len(), "value {value} left trailing bytes");
        }
    }

    #[test]
    fn compact_u16_known_encodings() {
        let cases: [(u16, &[u8]); 5] = [
            (0x00, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0x3fff, &[0xff, 0x7f]),
            (0x4000, &[0x80, 0x80, 0x01]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            encode_compact_u16(value, &mut buf);
            assert_eq!(buf, expected, "encoding of {value:#x}");
        }
    }

    #[test]
    fn compact_u16_rejects_truncation() {
        // A lone continuation byte promises more than the buffer holds.
        let mut cursor = 0;
        assert!(decode_compact_u16(&[0x80], &mut cursor).is_err());
    }

    #[test]
    fn compact_u16_rejects_overlong_encoding() {
        let mut cursor = 0;
        assert!(decode_compact_u16(&[0x80, 0x80, 0x80, 0x01], &mut cursor).is_err());
    }

    #[test]
    fn compact_u16_rejects_alias_encoding() {
        // [0x81, 0x00] would alias [0x01].
        let mut cursor = 0;
        assert!(decode_compact_u16(&[0x81, 0x00], &mut cursor).is_err());
    }

    #[test]
    fn compact_u16_rejects_out_of_range() {
        // 0x04 in the third byte pushes past u16::MAX.
        let mut cursor = 0;
        assert!(decode_compact_u16(&[0xff, 0xff, 0x04], &mut cursor).is_err());
    }

    // -- message -------------------------------------------------------------

    #[test]
    fn message_serialization_is_stable() {
        let msg = sample_message(2);
        assert_eq!(msg.serialize(), msg.serialize());
    }

    #[test]
    fn message_round_trips() {
        let msg = sample_message(2);
        let bytes = msg.serialize();
        let mut cursor = 0;
        let parsed = Message::deserialize(&bytes, &mut cursor).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(cursor, bytes.len());
    }

    // -- envelope ------------------------------------------------------------

    #[test]
    fn envelope_round_trips_at_every_signature_fill_level() {
        let kp = Keypair::generate();
        let mut envelope = TransactionEnvelope::unsigned(sample_message(3));

        for filled in 0..=3usize {
            let decoded = TransactionEnvelope::decode(&envelope.encode()).unwrap();
            assert_eq!(decoded, envelope, "round-trip with {filled} signatures");

            if filled < 3 {
                envelope.signatures[filled] = kp.sign(b"slot filler");
            }
        }
    }

    #[test]
    fn base64_transport_round_trips() {
        let envelope = TransactionEnvelope::unsigned(sample_message(1));
        let restored = TransactionEnvelope::from_base64(&envelope.to_base64()).unwrap();
        assert_eq!(restored, envelope);
    }

    #[test]
    fn unsigned_envelope_has_placeholder_slots() {
        let envelope = TransactionEnvelope::unsigned(sample_message(2));
        assert_eq!(envelope.signatures.len(), 2);
        assert!(envelope.signatures.iter().all(Signature::is_placeholder));
        assert!(!envelope.is_fully_signed());
    }

    #[test]
    fn decode_rejects_sig_count_header_disagreement() {
        let mut envelope = TransactionEnvelope::unsigned(sample_message(2));
        envelope.signatures.pop();
        let bytes = envelope.encode();
        match TransactionEnvelope::decode(&bytes) {
            Err(ToolError::MalformedTransaction(reason)) => {
                assert!(reason.contains("disagrees"), "reason: {reason}")
            }
            other => panic!("expected MalformedTransaction, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_truncated_account_keys() {
        let bytes = TransactionEnvelope::unsigned(sample_message(1)).encode();
        // Cut into the middle of the account key table.
        let cut = 3 + 64 + 3 + 2 + 40;
        assert!(matches!(
            TransactionEnvelope::decode(&bytes[..cut]),
            Err(ToolError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = TransactionEnvelope::unsigned(sample_message(1)).encode();
        bytes.push(0x00);
        match TransactionEnvelope::decode(&bytes) {
            Err(ToolError::MalformedTransaction(reason)) => {
                assert!(reason.contains("trailing"), "reason: {reason}")
            }
            other => panic!("expected MalformedTransaction, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_out_of_range_indexes() {
        let mut msg = sample_message(1);
        msg.instructions[0].program_id_index = 200;
        let bytes = TransactionEnvelope::unsigned(msg).encode();
        assert!(matches!(
            TransactionEnvelope::decode(&bytes),
            Err(ToolError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(TransactionEnvelope::decode(&[]).is_err());
    }

    #[test]
    fn from_base64_rejects_garbage() {
        assert!(TransactionEnvelope::from_base64("!!!not-base64!!!").is_err());
    }

    #[test]
    fn blockhash_base58_round_trip() {
        let bh = Blockhash::from_bytes([42u8; 32]);
        assert_eq!(Blockhash::from_base58(&bh.to_base58()), Some(bh));
        assert_eq!(Blockhash::from_base58("tooshort"), None);
    }
}
