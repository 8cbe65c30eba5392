//! Core transaction components
//!
//! This module contains the transaction model the signer works against:
//! - Legacy wire-format (de)serialization
//! - Transaction ids
//! - Legacy signature hashes (ALL, NONE, SINGLE, ANYONECANPAY)

pub mod transaction;

pub use transaction::{
    OutPoint, Transaction, TransactionBuilder, TransactionError, TxIn, TxOut, SEQUENCE_FINAL,
    TX_VERSION,
};
