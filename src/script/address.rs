//! Address codec
//!
//! Converts between base58check addresses and output scripts. The caller
//! supplies the allowed version bytes, which distinguish networks and the
//! pubkey-hash/script-hash namespaces.

use serde::{Deserialize, Serialize};

use super::classify::{
    classify_output_script, pay_to_pubkey_hash_script, pay_to_script_hash_script, ScriptType,
};
use super::error::ScriptError;
use crate::crypto::{base58check_decode, base58check_encode, HASH160_LEN};

/// Version bytes accepted for addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressVersions {
    /// Version byte of pay-to-pubkey-hash addresses
    pub pubkey_hash: u8,
    /// Version byte of pay-to-script-hash addresses
    pub script_hash: u8,
}

impl AddressVersions {
    pub const MAINNET: AddressVersions = AddressVersions {
        pubkey_hash: 0x00,
        script_hash: 0x05,
    };

    pub const TESTNET: AddressVersions = AddressVersions {
        pubkey_hash: 0x6f,
        script_hash: 0xc4,
    };

    /// Output template an address with this version byte pays to
    pub fn script_type_for(&self, version: u8) -> Option<ScriptType> {
        if version == self.pubkey_hash {
            Some(ScriptType::PayToPubkeyHash)
        } else if version == self.script_hash {
            Some(ScriptType::PayToScriptHash)
        } else {
            None
        }
    }

    /// Version byte used to encode an output of the given template
    pub fn version_for(&self, script_type: ScriptType) -> Option<u8> {
        match script_type {
            ScriptType::PayToPubkeyHash => Some(self.pubkey_hash),
            ScriptType::PayToScriptHash => Some(self.script_hash),
            _ => None,
        }
    }
}

impl Default for AddressVersions {
    fn default() -> Self {
        AddressVersions::MAINNET
    }
}

/// Network presets for address versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn address_versions(&self) -> AddressVersions {
        match self {
            Network::Mainnet => AddressVersions::MAINNET,
            Network::Testnet => AddressVersions::TESTNET,
        }
    }
}

fn decode_address(address: &str, versions: &AddressVersions) -> Result<(ScriptType, Vec<u8>), String> {
    let (version, payload) = base58check_decode(address).map_err(|e| e.to_string())?;
    let script_type = versions
        .script_type_for(version)
        .ok_or_else(|| format!("unexpected version byte 0x{:02x}", version))?;
    if payload.len() != HASH160_LEN {
        return Err(format!("payload is {} bytes, expected {}", payload.len(), HASH160_LEN));
    }
    Ok((script_type, payload))
}

/// Check whether an address decodes, carries an allowed version byte and
/// has a valid checksum
pub fn is_valid_address(address: &str, versions: &AddressVersions) -> bool {
    decode_address(address, versions).is_ok()
}

/// Build the output script paying to an address
pub fn address_to_output_script(
    address: &str,
    versions: &AddressVersions,
) -> Result<Vec<u8>, ScriptError> {
    let (script_type, hash) = decode_address(address, versions)
        .map_err(|reason| ScriptError::InvalidAddress(format!("{}: {}", address, reason)))?;

    Ok(match script_type {
        ScriptType::PayToScriptHash => pay_to_script_hash_script(&hash),
        _ => pay_to_pubkey_hash_script(&hash),
    })
}

/// Encode the address an output script pays to
pub fn output_script_to_address(
    script: &[u8],
    versions: &AddressVersions,
) -> Result<String, ScriptError> {
    let payee = classify_output_script(script);
    let version = versions
        .version_for(payee.script_type)
        .ok_or(ScriptError::UnsupportedScriptType(payee.script_type))?;
    Ok(base58check_encode(version, &payee.payload))
}
