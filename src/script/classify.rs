//! Output script classification
//!
//! Recognizes the standard output templates and extracts the key or hash
//! they commit to. Unrecognized scripts are a normal occurrence on the
//! network, so classification never fails: anything that does not match a
//! template exactly is `ScriptType::Unknown`.

use serde::{Deserialize, Serialize};

use super::opcodes::*;
use super::push::push_data;

/// Spending template of an output script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    /// Anything that is not one of the templates below
    Unknown,
    /// Zero-length script
    Empty,
    /// `<pubkey> OP_CHECKSIG`
    PayToPubkey,
    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    PayToPubkeyHash,
    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    PayToScriptHash,
}

impl ScriptType {
    /// Get the script type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptType::Unknown => "unknown",
            ScriptType::Empty => "empty",
            ScriptType::PayToPubkey => "pubkey",
            ScriptType::PayToPubkeyHash => "pubkeyhash",
            ScriptType::PayToScriptHash => "scripthash",
        }
    }
}

/// A classified output: its template and the embedded key or hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payee {
    pub script_type: ScriptType,
    /// Raw public key, key hash or script hash; empty for `Unknown`/`Empty`
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

impl Payee {
    pub fn new(script_type: ScriptType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            script_type,
            payload: payload.into(),
        }
    }

    fn bare(script_type: ScriptType) -> Self {
        Self {
            script_type,
            payload: Vec::new(),
        }
    }

    /// Rebuild the output script this payee was classified from
    ///
    /// Returns `None` for `Unknown`, whose bytes are not recoverable.
    pub fn to_output_script(&self) -> Option<Vec<u8>> {
        match self.script_type {
            ScriptType::Unknown => None,
            ScriptType::Empty => Some(Vec::new()),
            ScriptType::PayToPubkey => Some(pay_to_pubkey_script(&self.payload)),
            ScriptType::PayToPubkeyHash => Some(pay_to_pubkey_hash_script(&self.payload)),
            ScriptType::PayToScriptHash => Some(pay_to_script_hash_script(&self.payload)),
        }
    }
}

/// Classify an output script and extract its payload
pub fn classify_output_script(script: &[u8]) -> Payee {
    match script {
        [] => Payee::bare(ScriptType::Empty),
        [len @ (OP_PUSHBYTES_33 | OP_PUSHBYTES_65), key @ .., OP_CHECKSIG]
            if key.len() == *len as usize =>
        {
            Payee::new(ScriptType::PayToPubkey, key)
        }
        [OP_DUP, OP_HASH160, OP_PUSHBYTES_20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG]
            if hash.len() == 20 =>
        {
            Payee::new(ScriptType::PayToPubkeyHash, hash)
        }
        [OP_HASH160, OP_PUSHBYTES_20, hash @ .., OP_EQUAL] if hash.len() == 20 => {
            Payee::new(ScriptType::PayToScriptHash, hash)
        }
        _ => Payee::bare(ScriptType::Unknown),
    }
}

/// `<pubkey> OP_CHECKSIG`
pub fn pay_to_pubkey_script(pubkey: &[u8]) -> Vec<u8> {
    let mut script = push_data(pubkey);
    script.push(OP_CHECKSIG);
    script
}

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn pay_to_pubkey_hash_script(hash: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.extend(push_data(hash));
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// `OP_HASH160 <hash> OP_EQUAL`
pub fn pay_to_script_hash_script(hash: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.push(OP_HASH160);
    script.extend(push_data(hash));
    script.push(OP_EQUAL);
    script
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
