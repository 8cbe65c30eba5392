//! Multisig redeem scripts
//!
//! An M-of-N redeem script is `OP_M <pubkey>... OP_N OP_CHECKMULTISIG`.
//! Its HASH160 is what a pay-to-script-hash output commits to; the script
//! itself is revealed in the spending input.

use crate::crypto::{hash160, is_public_key_shape, HASH160_LEN};
use crate::script::opcodes::{small_int_opcode, small_int_value, OP_CHECKMULTISIG};
use crate::script::push::{push_data, read_push};
use crate::script::ScriptError;

/// Largest N expressible with a single small-integer opcode
pub const MAX_MULTISIG_KEYS: usize = 16;

/// Largest element that can be pushed onto the stack, which bounds the
/// redeem script since it is pushed in the input script
pub const MAX_REDEEM_SCRIPT_SIZE: usize = 520;

/// Threshold and ordered public keys of an M-of-N multisig condition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigConfig {
    /// Minimum signatures required (M in M-of-N)
    threshold: usize,
    /// Public keys in redeem script order
    pubkeys: Vec<Vec<u8>>,
}

impl MultisigConfig {
    /// Create a new multisig configuration
    ///
    /// # Errors
    /// Returns `InvalidScriptTemplate` if the threshold is outside
    /// `1..=pubkeys.len()`, there are more than 16 keys, a key is not
    /// 33/65 bytes, a key is repeated, or the redeem script would not fit
    /// in a single push.
    pub fn new(threshold: usize, pubkeys: Vec<Vec<u8>>) -> Result<Self, ScriptError> {
        if pubkeys.is_empty() {
            return Err(ScriptError::template("multisig requires at least one public key"));
        }

        if pubkeys.len() > MAX_MULTISIG_KEYS {
            return Err(ScriptError::template(format!(
                "{} public keys exceeds maximum of {}",
                pubkeys.len(),
                MAX_MULTISIG_KEYS
            )));
        }

        if threshold == 0 || threshold > pubkeys.len() {
            return Err(ScriptError::template(format!(
                "threshold {} outside 1..={}",
                threshold,
                pubkeys.len()
            )));
        }

        if let Some(bad) = pubkeys.iter().find(|k| !is_public_key_shape(k)) {
            return Err(ScriptError::template(format!(
                "not a public key: {}",
                hex::encode(bad)
            )));
        }

        // Slots are looked up by pubkey, so every key must be distinct
        let mut sorted = pubkeys.clone();
        sorted.sort();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(ScriptError::template("duplicate public key"));
        }

        let config = Self { threshold, pubkeys };
        let size = config.redeem_script().len();
        if size > MAX_REDEEM_SCRIPT_SIZE {
            return Err(ScriptError::template(format!(
                "redeem script is {} bytes, limit is {}",
                size, MAX_REDEEM_SCRIPT_SIZE
            )));
        }

        Ok(config)
    }

    /// Parse a redeem script back into its threshold and keys
    ///
    /// Only the canonical encoding produced by `redeem_script` is accepted,
    /// so parsing and re-serializing always reproduces the same hash.
    pub fn from_redeem_script(script: &[u8]) -> Result<Self, ScriptError> {
        let (first, last) = match script {
            [first, .., n, OP_CHECKMULTISIG] => (*first, *n),
            _ => return Err(ScriptError::malformed("redeem script too short")),
        };

        let threshold = small_int_value(first)
            .ok_or_else(|| ScriptError::malformed("redeem script does not start with OP_M"))?;
        let count = small_int_value(last)
            .ok_or_else(|| ScriptError::malformed("redeem script has no OP_N"))?;

        let body = &script[1..script.len() - 2];
        let mut pubkeys = Vec::with_capacity(count as usize);
        let mut pos = 0;
        while pos < body.len() {
            pubkeys.push(read_push(body, &mut pos)?.to_vec());
        }

        if pubkeys.len() != count as usize {
            return Err(ScriptError::malformed(format!(
                "redeem script declares {} keys but pushes {}",
                count,
                pubkeys.len()
            )));
        }

        let config = Self::new(threshold as usize, pubkeys)
            .map_err(|e| ScriptError::malformed(e.to_string()))?;
        if config.redeem_script() != script {
            return Err(ScriptError::malformed("non-canonical redeem script encoding"));
        }
        Ok(config)
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Public keys in redeem script order
    pub fn pubkeys(&self) -> &[Vec<u8>] {
        &self.pubkeys
    }

    /// Get the total signer count (N)
    pub fn signer_count(&self) -> usize {
        self.pubkeys.len()
    }

    /// Serialize as `OP_M <pubkeys> OP_N OP_CHECKMULTISIG`
    pub fn redeem_script(&self) -> Vec<u8> {
        let mut script = Vec::with_capacity(3 + self.pubkeys.iter().map(|k| k.len() + 1).sum::<usize>());
        // Both counts are within 1..=16, checked on construction
        script.extend(small_int_opcode(self.threshold as u8));
        for pubkey in &self.pubkeys {
            script.extend(push_data(pubkey));
        }
        script.extend(small_int_opcode(self.pubkeys.len() as u8));
        script.push(OP_CHECKMULTISIG);
        script
    }

    /// HASH160 of the redeem script
    pub fn script_hash(&self) -> [u8; HASH160_LEN] {
        hash160(&self.redeem_script())
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.pubkeys.len())
    }
}
