//! Opcode constants for the fixed template set
//!
//! Only the opcodes needed to classify and build pay-to-pubkey,
//! pay-to-pubkey-hash and pay-to-script-hash multisig scripts.

/// Push an empty byte vector (also the multisig dummy element)
pub const OP_0: u8 = 0x00;
/// Largest direct push: the opcode itself is the length
pub const OP_PUSHBYTES_75: u8 = 0x4b;
/// Next byte holds the push length
pub const OP_PUSHDATA1: u8 = 0x4c;
/// Next two bytes (little-endian) hold the push length
pub const OP_PUSHDATA2: u8 = 0x4d;
/// Next four bytes (little-endian) hold the push length
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number 1; OP_2..OP_16 follow consecutively
pub const OP_1: u8 = 0x51;
/// Push the number 16
pub const OP_16: u8 = 0x60;

pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Direct push of a 20-byte hash
pub const OP_PUSHBYTES_20: u8 = 0x14;
/// Direct push of a compressed public key
pub const OP_PUSHBYTES_33: u8 = 0x21;
/// Direct push of an uncompressed public key
pub const OP_PUSHBYTES_65: u8 = 0x41;

/// Opcode pushing the small integer `n` (1..=16)
pub fn small_int_opcode(n: u8) -> Option<u8> {
    match n {
        1..=16 => Some(OP_1 + n - 1),
        _ => None,
    }
}

/// Small integer pushed by `op`, if it is one of OP_1..OP_16
pub fn small_int_value(op: u8) -> Option<u8> {
    match op {
        OP_1..=OP_16 => Some(op - OP_1 + 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_ints() {
        assert_eq!(small_int_opcode(1), Some(OP_1));
        assert_eq!(small_int_opcode(16), Some(OP_16));
        assert_eq!(small_int_opcode(0), None);
        assert_eq!(small_int_opcode(17), None);

        for n in 1..=16 {
            assert_eq!(small_int_value(small_int_opcode(n).unwrap()), Some(n));
        }
        assert_eq!(small_int_value(OP_0), None);
        assert_eq!(small_int_value(OP_CHECKMULTISIG), None);
    }
}
