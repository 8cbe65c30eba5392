//! Script templates, classification and addresses
//!
//! This module contains:
//! - Push-data length encoding
//! - Output script classification (pay-to-pubkey, pubkey-hash, script-hash)
//! - The base58check address codec
//! - Signature hash types
//! - `Script`, the signable input-side representation of a spending
//!   condition with its partial signature set

pub mod address;
pub mod classify;
pub mod error;
pub mod opcodes;
pub mod push;
pub mod sighash;
pub mod template;

pub use address::{
    address_to_output_script, is_valid_address, output_script_to_address, AddressVersions,
    Network,
};
pub use classify::{
    classify_output_script, pay_to_pubkey_hash_script, pay_to_pubkey_script,
    pay_to_script_hash_script, Payee, ScriptType,
};
pub use error::ScriptError;
pub use push::{decode_push_length, encode_push_length, push_data, read_all_pushes, read_push};
pub use sighash::SigHashType;
pub use template::{BroadcastPolicy, Script, SigCheck, SigMode, TemplateType};
