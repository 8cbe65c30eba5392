//! Transaction signing with incremental multisig support

pub mod signer;

pub use signer::{Signer, SignerError};
