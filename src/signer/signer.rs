//! Signer implementation
//!
//! A `Signer` holds a transaction together with the parsed script of every
//! input. Each call to `sign` adds whatever signatures the given keys can
//! contribute and writes the updated input scripts back into the
//! transaction, so a partially signed transaction can be handed to the next
//! key holder and loaded again with `set_tx`.

use secp256k1::SecretKey;
use thiserror::Error;

use crate::core::{Transaction, TransactionError};
use crate::crypto::{derive_public_keys, sign_hash, verify_signature, KeyError};
use crate::script::{
    classify_output_script, BroadcastPolicy, Script, ScriptError, ScriptType, SigCheck, SigHashType,
    SigMode,
};

/// Signer-related errors
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Input {index}: {source}")]
    Input {
        index: usize,
        #[source]
        source: ScriptError,
    },
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("{prevouts} previous output scripts given for {inputs} inputs")]
    PrevoutCount { inputs: usize, prevouts: usize },
}

impl SignerError {
    fn input(index: usize) -> impl FnOnce(ScriptError) -> SignerError {
        move |source| SignerError::Input { index, source }
    }
}

/// Adds signatures to the inputs of a transaction
#[derive(Debug, Clone, Default)]
pub struct Signer {
    tx: Transaction,
    /// One per input, in input order
    scripts: Vec<Script>,
    is_signed: bool,
    sighash_type: SigHashType,
    broadcast_policy: BroadcastPolicy,
}

impl Signer {
    /// Create an empty signer holding no transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signer and load `tx` with the default sighash type
    pub fn from_tx(tx: Transaction, clear_invalid_sigs: bool) -> Result<Self, SignerError> {
        let mut signer = Self::new();
        signer.set_tx(tx, clear_invalid_sigs)?;
        Ok(signer)
    }

    /// Sighash type attached to new signatures
    ///
    /// Existing signatures are always verified under the type byte they
    /// carry, so inputs may mix types.
    pub fn with_sighash_type(mut self, sighash_type: SigHashType) -> Self {
        self.sighash_type = sighash_type;
        self
    }

    /// Policy for writing back inputs that are still missing signatures
    pub fn with_broadcast_policy(mut self, policy: BroadcastPolicy) -> Self {
        self.broadcast_policy = policy;
        self
    }

    /// Load a transaction, parsing and verifying every input script
    ///
    /// Input scripts must be in a self-describing form (pubkey-hash or
    /// multisig pay-to-script-hash). Each existing signature is checked
    /// against the input's signing hash for the sighash type it declares in
    /// its last byte; invalid ones are cleared if
    /// `clear_invalid_sigs` is set and rejected otherwise. On error the
    /// previously loaded state is kept.
    pub fn set_tx(&mut self, tx: Transaction, clear_invalid_sigs: bool) -> Result<(), SignerError> {
        self.load(tx, None, clear_invalid_sigs)
    }

    /// Load a transaction whose inputs are parsed against the output
    /// scripts they spend
    ///
    /// Needed for pay-to-pubkey inputs, whose key only appears in the
    /// previous output. `prevouts[i]` is the output script spent by input `i`.
    pub fn set_tx_with_prevouts(
        &mut self,
        tx: Transaction,
        prevouts: &[Vec<u8>],
        clear_invalid_sigs: bool,
    ) -> Result<(), SignerError> {
        if prevouts.len() != tx.inputs.len() {
            return Err(SignerError::PrevoutCount {
                inputs: tx.inputs.len(),
                prevouts: prevouts.len(),
            });
        }
        self.load(tx, Some(prevouts), clear_invalid_sigs)
    }

    fn load(
        &mut self,
        tx: Transaction,
        prevouts: Option<&[Vec<u8>]>,
        clear_invalid_sigs: bool,
    ) -> Result<(), SignerError> {
        let mut scripts = Vec::with_capacity(tx.inputs.len());
        for (index, input) in tx.inputs.iter().enumerate() {
            let prevout = prevouts.map(|p| p[index].as_slice());
            let script =
                Self::parse_input(&tx, index, &input.script_sig, prevout, clear_invalid_sigs)?;
            scripts.push(script);
        }

        self.tx = tx;
        self.scripts = scripts;
        self.update_signed();
        log::debug!(
            "Loaded transaction {} with {} input(s), signed: {}",
            self.tx.txid_hex(),
            self.scripts.len(),
            self.is_signed
        );
        Ok(())
    }

    fn parse_input(
        tx: &Transaction,
        index: usize,
        script_sig: &[u8],
        prevout: Option<&[u8]>,
        clear_invalid_sigs: bool,
    ) -> Result<Script, SignerError> {
        // Single-key templates sign over the previous output itself
        let subscript = match prevout {
            Some(out)
                if matches!(
                    classify_output_script(out).script_type,
                    ScriptType::PayToPubkey | ScriptType::PayToPubkeyHash
                ) =>
            {
                out.to_vec()
            }
            _ => Script::template_from_input_bytes(script_sig)
                .and_then(|template| template.txinscript(SigMode::Sign))
                .map_err(SignerError::input(index))?,
        };

        // Unknown type bytes and out-of-range inputs never verify
        let check: SigCheck<'_> = &|pubkey: &[u8], sig: &[u8]| {
            sig.last()
                .copied()
                .and_then(SigHashType::from_byte)
                .and_then(|sighash_type| tx.signature_hash(index, &subscript, sighash_type).ok())
                .is_some_and(|hash| verify_signature(pubkey, &hash, sig))
        };
        let script = match prevout {
            Some(out) => Script::from_input_bytes_for_output_checked(
                script_sig,
                out,
                Some(check),
                clear_invalid_sigs,
            ),
            None => Script::from_input_bytes_checked(script_sig, Some(check), clear_invalid_sigs),
        };
        script.map_err(SignerError::input(index))
    }

    /// Sign every incomplete input with the given private keys
    ///
    /// A key signs an input if its compressed or uncompressed public key
    /// owns an empty slot there. Inputs that already meet their threshold
    /// are left alone. Updated inputs are written back to the transaction in
    /// Broadcast form once complete. Before that they are written in Edit
    /// form, or in partial Broadcast form under `BroadcastPolicy::AllowPartial`.
    /// On error neither the transaction nor the scripts change.
    ///
    /// Returns the public keys for which a signature was newly added.
    pub fn sign(&mut self, privkeys: &[SecretKey]) -> Result<Vec<Vec<u8>>, SignerError> {
        let keys: Vec<(&SecretKey, [Vec<u8>; 2])> = privkeys
            .iter()
            .map(|secret| {
                let (compressed, uncompressed) = derive_public_keys(secret);
                (secret, [compressed, uncompressed])
            })
            .collect();

        let mut scripts = self.scripts.clone();
        let mut updates: Vec<(usize, Vec<u8>)> = Vec::new();
        let mut signed_with: Vec<Vec<u8>> = Vec::new();
        for (index, script) in scripts.iter_mut().enumerate() {
            if script.is_complete() {
                continue;
            }

            let mut signing_hash = None;
            let mut added = false;
            for (secret, forms) in &keys {
                if script.is_complete() {
                    break;
                }
                let missing = script.missingsigs();
                let Some(pubkey) = forms.iter().find(|pk| missing.contains(*pk)) else {
                    continue;
                };

                let hash = match signing_hash {
                    Some(hash) => hash,
                    None => {
                        let subscript = script
                            .txinscript(SigMode::Sign)
                            .map_err(SignerError::input(index))?;
                        let hash = self.tx.signature_hash(index, &subscript, self.sighash_type)?;
                        signing_hash = Some(hash);
                        hash
                    }
                };

                let sig = sign_hash(secret, &hash, self.sighash_type.to_byte())?;
                if script.add_sig(pubkey, sig) {
                    log::debug!("Input {}: added signature for {}", index, hex::encode(pubkey));
                    added = true;
                    if !signed_with.contains(pubkey) {
                        signed_with.push(pubkey.clone());
                    }
                }
            }

            if added {
                let mode = if script.is_complete()
                    || self.broadcast_policy == BroadcastPolicy::AllowPartial
                {
                    SigMode::Broadcast
                } else {
                    SigMode::Edit
                };
                let script_sig = script
                    .txinscript_with_policy(mode, self.broadcast_policy)
                    .map_err(SignerError::input(index))?;
                updates.push((index, script_sig));
            }
        }

        for (index, script_sig) in updates {
            self.tx.inputs[index].script_sig = script_sig;
        }
        self.scripts = scripts;
        self.update_signed();
        log::info!(
            "Signed with {} key(s); transaction {}",
            signed_with.len(),
            if self.is_signed { "complete" } else { "incomplete" }
        );
        Ok(signed_with)
    }

    fn update_signed(&mut self) {
        self.is_signed = self.scripts.iter().all(Script::is_complete);
    }

    /// Whether every input had enough signatures as of the last `set_tx`
    /// or `sign`
    ///
    /// False for a signer that has not loaded a transaction yet.
    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// The transaction with the input scripts written so far
    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn sighash_type(&self) -> SigHashType {
        self.sighash_type
    }

    /// Drop every signature and reset the inputs to unsigned Edit form
    pub fn clear_sigs(&mut self) -> Result<(), SignerError> {
        for (index, script) in self.scripts.iter_mut().enumerate() {
            script.clear_sigs();
            self.tx.inputs[index].script_sig = script
                .txinscript(SigMode::Edit)
                .map_err(SignerError::input(index))?;
        }
        self.is_signed = false;
        Ok(())
    }
}
