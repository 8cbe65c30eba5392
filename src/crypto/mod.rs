//! Cryptographic collaborators for script handling
//!
//! This module provides:
//! - SHA-256 / HASH160 digests
//! - Base58Check encoding
//! - ECDSA key management and transaction signatures (secp256k1)

pub mod base58;
pub mod hash;
pub mod keys;

pub use base58::{base58check_decode, base58check_encode, Base58Error};
pub use hash::{double_sha256, hash160, ripemd160, sha256, sha256_hex, HASH160_LEN};
pub use keys::{
    derive_public_keys, is_public_key_shape, serialize_public_key,
    sign_hash, verify_signature, KeyError, KeyPair, COMPRESSED_PUBKEY_LEN,
    UNCOMPRESSED_PUBKEY_LEN, WIF_MAINNET, WIF_TESTNET,
};
