//! Multi-signature redeem script support
//!
//! Provides M-of-N threshold conditions where M signatures from N listed
//! public keys are required to spend a pay-to-script-hash output.
//!
//! # Example
//!
//! ```ignore
//! use coin_script::multisig::MultisigConfig;
//!
//! // Create a 2-of-3 multisig condition
//! let config = MultisigConfig::new(2, vec![pubkey1, pubkey2, pubkey3])?;
//! let redeem_script = config.redeem_script();
//! let script_hash = config.script_hash();
//! ```

pub mod redeem;

pub use redeem::{MultisigConfig, MAX_MULTISIG_KEYS, MAX_REDEEM_SCRIPT_SIZE};
