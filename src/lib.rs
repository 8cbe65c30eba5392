//! coin-script: output script templates, addresses and multisig signing
//!
//! This crate provides:
//! - Push-data length encoding and output script classification
//!   (pay-to-pubkey, pay-to-pubkey-hash, pay-to-script-hash)
//! - Base58Check address conversion with configurable version bytes
//! - `Script`, an input script with per-key signature slots that can be
//!   filled incrementally and merged across independent signers
//! - M-of-N multisig redeem scripts
//! - Legacy transaction encoding and signature hashes
//! - `Signer`, which signs every input of a transaction it can
//!
//! # Example
//!
//! ```rust
//! use coin_script::core::{OutPoint, TransactionBuilder};
//! use coin_script::crypto::KeyPair;
//! use coin_script::script::{Script, SigMode, TemplateType};
//! use coin_script::signer::Signer;
//!
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let pubkeys = keys.iter().map(|k| k.public_key_bytes()).collect();
//! let multisig = Script::from_template(TemplateType::PayToMultisigScriptHash, 2, pubkeys).unwrap();
//!
//! let tx = TransactionBuilder::new()
//!     .add_input(OutPoint { txid: [1; 32], vout: 0 }, multisig.txinscript(SigMode::Edit).unwrap())
//!     .add_output(10_000, multisig.txoutscript())
//!     .build();
//!
//! // First key holder
//! let mut signer = Signer::from_tx(tx, false).unwrap();
//! signer.sign(&[keys[0].secret_key]).unwrap();
//! assert!(!signer.is_signed());
//!
//! // Second key holder completes the input
//! let mut signer = Signer::from_tx(signer.tx().clone(), false).unwrap();
//! signer.sign(&[keys[2].secret_key]).unwrap();
//! assert!(signer.is_signed());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod script;
pub mod signer;

// Re-export commonly used types
pub use config::Config;
pub use core::{Transaction, TransactionBuilder};
pub use crypto::KeyPair;
pub use multisig::MultisigConfig;
pub use script::{
    AddressVersions, BroadcastPolicy, Payee, Script, ScriptError, ScriptType, SigHashType,
    SigMode, TemplateType,
};
pub use signer::{Signer, SignerError};
