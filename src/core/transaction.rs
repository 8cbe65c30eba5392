//! Transactions in the legacy Bitcoin wire format
//!
//! Only what script signing needs: byte-exact (de)serialization, the
//! transaction id, and the legacy signature hash that input signatures
//! commit to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::double_sha256;
use crate::script::SigHashType;

// =============================================================================
// Constants
// =============================================================================

/// Default transaction version
pub const TX_VERSION: u32 = 1;

/// Sequence number that disables locktime
pub const SEQUENCE_FINAL: u32 = 0xFFFFFFFF;

/// Value written for blanked outputs under SIGHASH_SINGLE
const BLANK_OUTPUT_VALUE: u64 = u64::MAX;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Unexpected end of data at offset {0}")]
    Truncated(usize),
    #[error("{0} trailing bytes after transaction")]
    TrailingData(usize),
    #[error("Input index {index} out of range ({count} inputs)")]
    InputIndexOutOfRange { index: usize, count: usize },
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Previous transaction id in internal (wire) byte order
    pub txid: [u8; 32],
    pub vout: u32,
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub previous_output: OutPoint,
    /// Input script (scriptSig)
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: u64,
    /// Output script (scriptPubKey)
    pub script_pubkey: Vec<u8>,
}

// =============================================================================
// Transaction
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }
}

impl Transaction {
    /// Serialize to wire format
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.previous_output.txid);
            out.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            write_var_bytes(&mut out, &input.script_sig);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_var_bytes(&mut out, &output.script_pubkey);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Parse from wire format; the whole buffer must be consumed
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);
        let version = reader.read_u32()?;

        let input_count = reader.read_compact_size()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let txid = reader.read_array::<32>()?;
            let vout = reader.read_u32()?;
            let script_sig = reader.read_var_bytes()?;
            let sequence = reader.read_u32()?;
            inputs.push(TxIn {
                previous_output: OutPoint { txid, vout },
                script_sig,
                sequence,
            });
        }

        let output_count = reader.read_compact_size()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let value = reader.read_u64()?;
            let script_pubkey = reader.read_var_bytes()?;
            outputs.push(TxOut {
                value,
                script_pubkey,
            });
        }

        let lock_time = reader.read_u32()?;
        if reader.remaining() > 0 {
            return Err(TransactionError::TrailingData(reader.remaining()));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes =
            hex::decode(hex_str.trim()).map_err(|e| TransactionError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Transaction id in internal byte order
    pub fn txid(&self) -> [u8; 32] {
        double_sha256(&self.serialize())
    }

    /// Transaction id as conventionally displayed (byte-reversed hex)
    pub fn txid_hex(&self) -> String {
        let mut id = self.txid();
        id.reverse();
        hex::encode(id)
    }

    /// Legacy signature hash of input `input_index`
    ///
    /// `subscript` replaces the input's script in the preimage (the previous
    /// output script, or the redeem script for pay-to-script-hash). Every
    /// other input script is blanked.
    pub fn signature_hash(
        &self,
        input_index: usize,
        subscript: &[u8],
        sighash_type: SigHashType,
    ) -> Result<[u8; 32], TransactionError> {
        if input_index >= self.inputs.len() {
            return Err(TransactionError::InputIndexOutOfRange {
                index: input_index,
                count: self.inputs.len(),
            });
        }

        let base = sighash_type.base_type();
        if base == SigHashType::Single && input_index >= self.outputs.len() {
            // Consensus quirk: a SINGLE signature with no matching output
            // commits to the constant 1
            let mut one = [0u8; 32];
            one[0] = 1;
            return Ok(one);
        }

        let mut tx = self.clone();
        for (i, input) in tx.inputs.iter_mut().enumerate() {
            if i == input_index {
                input.script_sig = subscript.to_vec();
            } else {
                input.script_sig.clear();
                if base != SigHashType::All {
                    input.sequence = 0;
                }
            }
        }

        match base {
            SigHashType::None => tx.outputs.clear(),
            SigHashType::Single => {
                tx.outputs.truncate(input_index + 1);
                for output in &mut tx.outputs[..input_index] {
                    output.value = BLANK_OUTPUT_VALUE;
                    output.script_pubkey.clear();
                }
            }
            _ => {}
        }

        if sighash_type.is_anyone_can_pay() {
            let input = tx.inputs.swap_remove(input_index);
            tx.inputs = vec![input];
        }

        let mut preimage = tx.serialize();
        preimage.extend_from_slice(&sighash_type.to_u32().to_le_bytes());
        Ok(double_sha256(&preimage))
    }
}

// =============================================================================
// Transaction Builder
// =============================================================================

pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            tx: Transaction::default(),
        }
    }

    /// Add an input spending `previous_output` with an initial input script
    pub fn add_input(mut self, previous_output: OutPoint, script_sig: Vec<u8>) -> Self {
        self.tx.inputs.push(TxIn {
            previous_output,
            script_sig,
            sequence: SEQUENCE_FINAL,
        });
        self
    }

    /// Add an output
    pub fn add_output(mut self, value: u64, script_pubkey: Vec<u8>) -> Self {
        self.tx.outputs.push(TxOut {
            value,
            script_pubkey,
        });
        self
    }

    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.tx.lock_time = lock_time;
        self
    }

    pub fn build(self) -> Transaction {
        self.tx
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Wire Encoding Helpers
// =============================================================================

fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TransactionError> {
        if n > self.remaining() {
            return Err(TransactionError::Truncated(self.pos));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TransactionError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, TransactionError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u32(&mut self) -> Result<u32, TransactionError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, TransactionError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    fn read_compact_size(&mut self) -> Result<u64, TransactionError> {
        Ok(match self.read_u8()? {
            0xfd => u16::from_le_bytes(self.read_array()?) as u64,
            0xfe => u32::from_le_bytes(self.read_array()?) as u64,
            0xff => self.read_u64()?,
            n => n as u64,
        })
    }

    fn read_var_bytes(&mut self) -> Result<Vec<u8>, TransactionError> {
        let start = self.pos;
        let len = self.read_compact_size()?;
        if len > self.remaining() as u64 {
            return Err(TransactionError::Truncated(start));
        }
        Ok(self.take(len as usize)?.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn outpoint(n: u8) -> OutPoint {
        OutPoint {
            txid: [n; 32],
            vout: n as u32,
        }
    }

    fn sample_tx() -> Transaction {
        TransactionBuilder::new()
            .add_input(outpoint(1), vec![0x00, 0x01, 0xaa])
            .add_input(outpoint(2), vec![])
            .add_output(50_000, vec![0x76, 0xa9])
            .add_output(12_345, vec![0xa9, 0x87])
            .lock_time(600_000)
            .build()
    }

    #[test]
    fn test_serialize_round_trip() {
        let tx = sample_tx();
        let bytes = tx.serialize();
        assert_eq!(&bytes[..4], &TX_VERSION.to_le_bytes());
        assert_eq!(bytes[4], 2);
        assert_eq!(Transaction::deserialize(&bytes).unwrap(), tx);
        assert_eq!(Transaction::from_hex(&tx.to_hex()).unwrap(), tx);
    }

    #[test]
    fn test_deserialize_errors() {
        let bytes = sample_tx().serialize();
        assert!(matches!(
            Transaction::deserialize(&bytes[..bytes.len() - 1]),
            Err(TransactionError::Truncated(_))
        ));

        let mut extra = bytes.clone();
        extra.push(0);
        assert_eq!(
            Transaction::deserialize(&extra),
            Err(TransactionError::TrailingData(1))
        );

        assert!(matches!(
            Transaction::from_hex("zz"),
            Err(TransactionError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_compact_size() {
        for (n, len) in [(0u64, 1), (0xfc, 1), (0xfd, 3), (0xffff, 3), (0x10000, 5), (1 << 32, 9)] {
            let mut out = Vec::new();
            write_compact_size(&mut out, n);
            assert_eq!(out.len(), len);
            assert_eq!(Reader::new(&out).read_compact_size().unwrap(), n);
        }
    }

    #[test]
    fn test_txid_display_is_reversed() {
        let tx = sample_tx();
        let mut internal = tx.txid();
        internal.reverse();
        assert_eq!(tx.txid_hex(), hex::encode(internal));
    }

    #[test]
    fn test_signature_hash_ignores_other_input_scripts() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.inputs[1].script_sig = vec![0x51];
        other.inputs[0].script_sig = vec![0x52];

        for sighash in [SigHashType::All, SigHashType::None, SigHashType::Single] {
            assert_eq!(
                tx.signature_hash(0, b"sub", sighash).unwrap(),
                other.signature_hash(0, b"sub", sighash).unwrap()
            );
        }
        assert_ne!(
            tx.signature_hash(0, b"sub", SigHashType::All).unwrap(),
            tx.signature_hash(0, b"other", SigHashType::All).unwrap()
        );
    }

    #[test]
    fn test_signature_hash_types_commit_differently() {
        let tx = sample_tx();
        let all = tx.signature_hash(0, b"sub", SigHashType::All).unwrap();
        let none = tx.signature_hash(0, b"sub", SigHashType::None).unwrap();
        let single = tx.signature_hash(0, b"sub", SigHashType::Single).unwrap();
        assert_ne!(all, none);
        assert_ne!(all, single);
        assert_ne!(none, single);

        // NONE does not commit to outputs
        let mut changed = tx.clone();
        changed.outputs[1].value += 1;
        assert_eq!(changed.signature_hash(0, b"sub", SigHashType::None).unwrap(), none);
        // SINGLE only commits to the output at the same index
        assert_eq!(changed.signature_hash(0, b"sub", SigHashType::Single).unwrap(), single);
        assert_ne!(changed.signature_hash(0, b"sub", SigHashType::All).unwrap(), all);
    }

    #[test]
    fn test_anyone_can_pay_ignores_other_inputs() {
        let tx = sample_tx();
        let mut more = tx.clone();
        more.inputs.push(TxIn {
            previous_output: outpoint(9),
            script_sig: vec![],
            sequence: SEQUENCE_FINAL,
        });

        let sighash = SigHashType::AllAnyoneCanPay;
        assert_eq!(
            tx.signature_hash(0, b"sub", sighash).unwrap(),
            more.signature_hash(0, b"sub", sighash).unwrap()
        );
        assert_ne!(
            tx.signature_hash(0, b"sub", SigHashType::All).unwrap(),
            more.signature_hash(0, b"sub", SigHashType::All).unwrap()
        );
    }

    #[test]
    fn test_single_without_matching_output() {
        let mut tx = sample_tx();
        tx.outputs.truncate(1);
        let hash = tx.signature_hash(1, b"sub", SigHashType::Single).unwrap();
        let mut one = [0u8; 32];
        one[0] = 1;
        assert_eq!(hash, one);
    }

    #[test]
    fn test_input_index_out_of_range() {
        assert_eq!(
            sample_tx().signature_hash(2, b"sub", SigHashType::All),
            Err(TransactionError::InputIndexOutOfRange { index: 2, count: 2 })
        );
    }
}
