//! Signature hash types
//!
//! The sighash type is appended to every transaction signature and decides
//! which parts of the transaction the signature commits to. Building the
//! digest itself is the transaction's job (`Transaction::signature_hash`).

use serde::{Deserialize, Serialize};

/// Mask extracting the base type (ALL, NONE, SINGLE) from a sighash byte
pub const SIGHASH_BASE_MASK: u8 = 0x1f;
/// ANYONECANPAY modifier bit
pub const SIGHASH_ANYONECANPAY_BIT: u8 = 0x80;

/// Signature hash type determines what parts of the transaction are signed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SigHashType {
    /// Sign all inputs and all outputs (default)
    All = 0x01,
    /// Sign all inputs but no outputs
    None = 0x02,
    /// Sign all inputs and only the output with same index
    Single = 0x03,
    /// Only sign own input (combined with ALL when used alone)
    AnyoneCanPay = 0x80,
    /// SIGHASH_ALL | SIGHASH_ANYONECANPAY
    AllAnyoneCanPay = 0x81,
    /// SIGHASH_NONE | SIGHASH_ANYONECANPAY
    NoneAnyoneCanPay = 0x82,
    /// SIGHASH_SINGLE | SIGHASH_ANYONECANPAY
    SingleAnyoneCanPay = 0x83,
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType::All
    }
}

impl SigHashType {
    /// Parse sighash type from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(SigHashType::All),
            0x02 => Some(SigHashType::None),
            0x03 => Some(SigHashType::Single),
            0x80 => Some(SigHashType::AnyoneCanPay),
            0x81 => Some(SigHashType::AllAnyoneCanPay),
            0x82 => Some(SigHashType::NoneAnyoneCanPay),
            0x83 => Some(SigHashType::SingleAnyoneCanPay),
            _ => None,
        }
    }

    /// Byte appended to signatures
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Value serialized (as 4 little-endian bytes) into the signing preimage
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    /// Check if this sighash includes ANYONECANPAY flag
    pub fn is_anyone_can_pay(&self) -> bool {
        (*self as u8) & SIGHASH_ANYONECANPAY_BIT != 0
    }

    /// Get the base type (without ANYONECANPAY flag)
    pub fn base_type(&self) -> SigHashType {
        match (*self as u8) & SIGHASH_BASE_MASK {
            0x02 => SigHashType::None,
            0x03 => SigHashType::Single,
            _ => SigHashType::All,
        }
    }
}
