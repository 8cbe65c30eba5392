//! ECDSA key management for script signing
//!
//! Provides key pair generation, WIF import/export, and transaction
//! signature creation/verification using the secp256k1 curve.
//!
//! Transaction signatures are DER-encoded with the sighash type appended
//! as a single trailing byte, the form that is pushed into input scripts.

use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::base58::{base58check_decode, base58check_encode};
use super::hash::hash160;

/// WIF version byte for mainnet private keys
pub const WIF_MAINNET: u8 = 0x80;
/// WIF version byte for testnet private keys
pub const WIF_TESTNET: u8 = 0xef;

/// Length of a compressed SEC1 public key
pub const COMPRESSED_PUBKEY_LEN: usize = 33;
/// Length of an uncompressed SEC1 public key
pub const UNCOMPRESSED_PUBKEY_LEN: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid WIF: {0}")]
    InvalidWif(String),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    /// Whether scripts reference the compressed form of the public key
    pub compressed: bool,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
            compressed: true,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
            compressed: true,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Import a private key in wallet import format
    ///
    /// The version byte is not checked against a network; a trailing
    /// `0x01` marker selects the compressed public key form.
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let (_, payload) =
            base58check_decode(wif).map_err(|e| KeyError::InvalidWif(e.to_string()))?;

        let (key, compressed) = match payload.len() {
            32 => (&payload[..], false),
            33 if payload[32] == 0x01 => (&payload[..32], true),
            n => return Err(KeyError::InvalidWif(format!("unexpected payload length {}", n))),
        };

        let secret_key = SecretKey::from_slice(key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let mut key_pair = Self::from_secret_key(secret_key);
        key_pair.compressed = compressed;
        Ok(key_pair)
    }

    /// Export the private key in wallet import format
    pub fn to_wif(&self, version: u8) -> String {
        let mut payload = self.secret_key.secret_bytes().to_vec();
        if self.compressed {
            payload.push(0x01);
        }
        base58check_encode(version, &payload)
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Serialized public key in the form this key pair is configured for
    pub fn public_key_bytes(&self) -> Vec<u8> {
        serialize_public_key(&self.public_key, self.compressed)
    }

    /// Get the public key as a hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// HASH160 of the serialized public key
    pub fn public_key_hash(&self) -> [u8; 20] {
        hash160(&self.public_key_bytes())
    }

    /// Pay-to-pubkey-hash address for this key under the given version byte
    pub fn address(&self, version: u8) -> String {
        base58check_encode(version, &self.public_key_hash())
    }

    /// Sign a 32-byte signing hash, appending the sighash type byte
    pub fn sign(&self, signing_hash: &[u8], sighash_byte: u8) -> Result<Vec<u8>, KeyError> {
        sign_hash(&self.secret_key, signing_hash, sighash_byte)
    }
}

/// Serialize a public key in compressed (33 byte) or uncompressed (65 byte) form
pub fn serialize_public_key(public_key: &PublicKey, compressed: bool) -> Vec<u8> {
    if compressed {
        public_key.serialize().to_vec()
    } else {
        public_key.serialize_uncompressed().to_vec()
    }
}

/// Derive both serialized public key forms for a private key
///
/// Returns `(compressed, uncompressed)`.
pub fn derive_public_keys(secret_key: &SecretKey) -> (Vec<u8>, Vec<u8>) {
    let secp = Secp256k1::new();
    let public_key = PublicKey::from_secret_key(&secp, secret_key);
    (
        serialize_public_key(&public_key, true),
        serialize_public_key(&public_key, false),
    )
}

/// Whether bytes have the shape of a SEC1 public key
///
/// Only the length and prefix byte are checked, not that the point is on
/// the curve.
pub fn is_public_key_shape(bytes: &[u8]) -> bool {
    match bytes.len() {
        COMPRESSED_PUBKEY_LEN => bytes[0] == 0x02 || bytes[0] == 0x03,
        UNCOMPRESSED_PUBKEY_LEN => bytes[0] == 0x04,
        _ => false,
    }
}

/// Sign a signing hash with a secret key
///
/// Produces a low-S DER signature followed by `sighash_byte`.
pub fn sign_hash(
    secret_key: &SecretKey,
    signing_hash: &[u8],
    sighash_byte: u8,
) -> Result<Vec<u8>, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(signing_hash)?;
    let signature = secp.sign_ecdsa(&message, secret_key);

    let mut bytes = signature.serialize_der().to_vec();
    bytes.push(sighash_byte);
    Ok(bytes)
}

/// Verify a script signature (DER plus sighash byte) against a public key
///
/// Any decoding failure counts as an invalid signature.
pub fn verify_signature(public_key: &[u8], signing_hash: &[u8], signature: &[u8]) -> bool {
    let Some((_, der)) = signature.split_last() else {
        return false;
    };

    let secp = Secp256k1::verification_only();
    let Ok(public_key) = PublicKey::from_slice(public_key) else {
        return false;
    };
    let Ok(message) = Message::from_digest_slice(signing_hash) else {
        return false;
    };
    let Ok(mut sig) = Signature::from_der_lax(der) else {
        return false;
    };
    sig.normalize_s();

    secp.verify_ecdsa(&message, &sig, &public_key).is_ok()
}
