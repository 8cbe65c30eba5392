//! Runtime configuration
//!
//! Selects the address versions, broadcast policy and sighash type used by
//! the command line tool. Stored as JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

use crate::script::{AddressVersions, BroadcastPolicy, Network, SigHashType};
use crate::signer::Signer;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: Network,
    /// Overrides the network's address version bytes
    pub address_versions: Option<AddressVersions>,
    pub broadcast_policy: BroadcastPolicy,
    pub sighash_type: SigHashType,
}

impl Config {
    /// Default configuration for a network
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Address versions in effect
    pub fn address_versions(&self) -> AddressVersions {
        self.address_versions
            .unwrap_or_else(|| self.network.address_versions())
    }

    /// An empty signer using the configured sighash type and broadcast policy
    pub fn signer(&self) -> Signer {
        Signer::new()
            .with_sighash_type(self.sighash_type)
            .with_broadcast_policy(self.broadcast_policy)
    }
}
