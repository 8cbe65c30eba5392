//! Signable input scripts
//!
//! A `Script` is the parsed form of a spending condition together with the
//! signatures collected for it so far. Each public key owns one signature
//! slot; a slot is either filled or an explicit placeholder, so partial
//! signature sets from independent signers can be merged without ever
//! pairing a signature with the wrong key.
//!
//! Input script layouts (`<x>` is a push, `OP_0` an empty push):
//!
//! | template      | Edit                              | Broadcast                            |
//! |---------------|-----------------------------------|--------------------------------------|
//! | pay-to-pubkey | `<sig or OP_0>`                   | `<sig>`                              |
//! | pubkey-hash   | `<sig or OP_0> <pubkey>`          | `<sig> <pubkey>`                     |
//! | multisig P2SH | `OP_0 <sig or OP_0>×N <redeem>`   | `OP_0 <sig>×M <redeem>`              |
//!
//! The leading `OP_0` of the multisig forms is the dummy element consumed
//! by `OP_CHECKMULTISIG`, not a placeholder.

use serde::{Deserialize, Serialize};

use super::classify::{
    classify_output_script, pay_to_pubkey_hash_script, pay_to_pubkey_script,
    pay_to_script_hash_script, Payee, ScriptType,
};
use super::error::ScriptError;
use super::opcodes::OP_0;
use super::push::{push_data, read_all_pushes};
use crate::crypto::{hash160, is_public_key_shape, verify_signature};
use crate::multisig::MultisigConfig;

/// Spending template of an input script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateType {
    Unknown,
    PayToPubkey,
    PayToPubkeyHash,
    PayToMultisigScriptHash,
}

impl TemplateType {
    /// Output template an input of this type spends
    pub fn output_type(&self) -> ScriptType {
        match self {
            TemplateType::Unknown => ScriptType::Unknown,
            TemplateType::PayToPubkey => ScriptType::PayToPubkey,
            TemplateType::PayToPubkeyHash => ScriptType::PayToPubkeyHash,
            TemplateType::PayToMultisigScriptHash => ScriptType::PayToScriptHash,
        }
    }
}

/// Serialization form of an input script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigMode {
    /// All slots, with `OP_0` placeholders for missing signatures
    Edit,
    /// The subscript committed to by the signing hash
    Sign,
    /// Present signatures only, as it goes on the wire
    Broadcast,
}

/// What Broadcast serialization does while signatures are still missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastPolicy {
    /// Fail with `IncompleteScript`
    #[default]
    RequireComplete,
    /// Emit whatever signatures are present
    AllowPartial,
}

/// A spending condition and its (possibly partial) signature set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    template: TemplateType,
    minsigs: usize,
    pubkeys: Vec<Vec<u8>>,
    /// Same length and order as `pubkeys`; `None` is a placeholder
    sigs: Vec<Option<Vec<u8>>>,
    /// Empty unless the template is multisig
    redeemscript: Vec<u8>,
    /// Key hash or script hash; empty for pay-to-pubkey
    hash: Vec<u8>,
}

/// Verifies one signature (DER plus sighash byte) against a public key
pub type SigCheck<'a> = &'a dyn Fn(&[u8], &[u8]) -> bool;

/// Run `f` with a check against a single fixed signing hash, if any
fn with_fixed_hash<T>(
    signing_hash: Option<&[u8]>,
    f: impl FnOnce(Option<SigCheck<'_>>) -> T,
) -> T {
    match signing_hash {
        Some(hash) => {
            let check: SigCheck<'_> =
                &|pubkey: &[u8], sig: &[u8]| verify_signature(pubkey, hash, sig);
            f(Some(check))
        }
        None => f(None),
    }
}

/// Structural reading of an input script, before signatures are aligned
enum InputShape<'a> {
    KeyHash {
        sig: &'a [u8],
        pubkey: &'a [u8],
    },
    Multisig {
        config: MultisigConfig,
        sigs: Vec<&'a [u8]>,
    },
}

impl<'a> InputShape<'a> {
    fn parse(txinscript: &'a [u8]) -> Result<Self, ScriptError> {
        if txinscript.is_empty() {
            return Err(ScriptError::malformed("empty input script"));
        }

        let items = read_all_pushes(txinscript)?;
        match items.as_slice() {
            [sig, pubkey] if is_public_key_shape(pubkey) => Ok(InputShape::KeyHash {
                sig: *sig,
                pubkey: *pubkey,
            }),
            [dummy, sigs @ .., redeemscript] if dummy.is_empty() => Ok(InputShape::Multisig {
                config: MultisigConfig::from_redeem_script(redeemscript)?,
                sigs: sigs.to_vec(),
            }),
            _ => Err(ScriptError::malformed(format!(
                "{} pushed item(s) match no known input template",
                items.len()
            ))),
        }
    }

    fn into_parts(self) -> Result<(Script, Vec<&'a [u8]>), ScriptError> {
        let (script, sigs) = match self {
            InputShape::KeyHash { sig, pubkey } => (
                Script::from_template(TemplateType::PayToPubkeyHash, 1, vec![pubkey.to_vec()]),
                vec![sig],
            ),
            InputShape::Multisig { config, sigs } => (Ok(Script::from_multisig(config)), sigs),
        };
        let script = script.map_err(|e| ScriptError::malformed(e.to_string()))?;
        Ok((script, sigs))
    }
}

impl Script {
    /// Build a script from its template with every signature slot empty
    ///
    /// Single-key templates take exactly one public key and always need one
    /// signature, whatever `minsigs` says.
    pub fn from_template(
        template: TemplateType,
        minsigs: usize,
        pubkeys: Vec<Vec<u8>>,
    ) -> Result<Self, ScriptError> {
        match template {
            TemplateType::Unknown => Err(ScriptError::template("cannot build an unknown template")),
            TemplateType::PayToPubkey | TemplateType::PayToPubkeyHash => {
                let [pubkey] = <[Vec<u8>; 1]>::try_from(pubkeys).map_err(|keys| {
                    ScriptError::template(format!(
                        "single-key template needs exactly 1 public key, got {}",
                        keys.len()
                    ))
                })?;
                if !is_public_key_shape(&pubkey) {
                    return Err(ScriptError::template(format!(
                        "not a public key: {}",
                        hex::encode(&pubkey)
                    )));
                }

                let hash = if template == TemplateType::PayToPubkeyHash {
                    hash160(&pubkey).to_vec()
                } else {
                    Vec::new()
                };

                Ok(Self {
                    template,
                    minsigs: 1,
                    pubkeys: vec![pubkey],
                    sigs: vec![None],
                    redeemscript: Vec::new(),
                    hash,
                })
            }
            TemplateType::PayToMultisigScriptHash => {
                Ok(Self::from_multisig(MultisigConfig::new(minsigs, pubkeys)?))
            }
        }
    }

    /// Build a script from its template with an initial signature set
    ///
    /// `sigs` must line up with `pubkeys`. Zero-length signatures are
    /// treated as placeholders.
    pub fn from_template_with_sigs(
        template: TemplateType,
        minsigs: usize,
        pubkeys: Vec<Vec<u8>>,
        sigs: Vec<Option<Vec<u8>>>,
    ) -> Result<Self, ScriptError> {
        let mut script = Self::from_template(template, minsigs, pubkeys)?;
        if sigs.len() != script.pubkeys.len() {
            return Err(ScriptError::template(format!(
                "{} signature slots for {} public keys",
                sigs.len(),
                script.pubkeys.len()
            )));
        }
        script.sigs = sigs
            .into_iter()
            .map(|sig| sig.filter(|s| !s.is_empty()))
            .collect();
        Ok(script)
    }

    fn from_multisig(config: MultisigConfig) -> Self {
        let redeemscript = config.redeem_script();
        let hash = hash160(&redeemscript).to_vec();
        Self {
            template: TemplateType::PayToMultisigScriptHash,
            minsigs: config.threshold(),
            sigs: vec![None; config.signer_count()],
            pubkeys: config.pubkeys().to_vec(),
            redeemscript,
            hash,
        }
    }

    /// Parse a serialized input script
    ///
    /// Recognizes `<sig> <pubkey>` (pay-to-pubkey-hash) and
    /// `OP_0 <sigs>... <redeem script>` (multisig pay-to-script-hash), with
    /// empty pushes standing in for missing signatures.
    ///
    /// Without a `signing_hash` no signature is checked, and a multisig input
    /// must carry one slot per key (Edit form). With a `signing_hash` every
    /// signature is verified against its key; inputs with fewer signatures
    /// than keys (Broadcast form) are aligned by matching each signature to
    /// the next key that verifies it. A failed verification clears the slot
    /// if `clear_invalid_sigs` is set and fails with `InvalidSignature`
    /// otherwise.
    pub fn from_input_bytes(
        txinscript: &[u8],
        signing_hash: Option<&[u8]>,
        clear_invalid_sigs: bool,
    ) -> Result<Self, ScriptError> {
        with_fixed_hash(signing_hash, |check| {
            Self::from_input_bytes_checked(txinscript, check, clear_invalid_sigs)
        })
    }

    /// Like `from_input_bytes`, with signatures verified by `check`
    ///
    /// Lets the caller derive a digest per signature, e.g. from the sighash
    /// type byte each signature carries.
    pub fn from_input_bytes_checked(
        txinscript: &[u8],
        check: Option<SigCheck<'_>>,
        clear_invalid_sigs: bool,
    ) -> Result<Self, ScriptError> {
        let (mut script, sigs) = InputShape::parse(txinscript)?.into_parts()?;
        script.fill_sigs(&sigs, check, clear_invalid_sigs)?;
        log::debug!(
            "Parsed {:?} input: {}/{} signatures",
            script.template,
            script.presentsigs().len(),
            script.minsigs
        );
        Ok(script)
    }

    /// Parse only the structure of an input script, leaving every slot empty
    ///
    /// This is enough to produce the Sign form, which the signing hash
    /// needed by `from_input_bytes` is computed over.
    pub fn template_from_input_bytes(txinscript: &[u8]) -> Result<Self, ScriptError> {
        Ok(InputShape::parse(txinscript)?.into_parts()?.0)
    }

    /// Parse a multisig input against a redeem script supplied out of band
    ///
    /// The input may omit the redeem script (and, when it carries no
    /// signatures at all, be empty). If it does embed one, it must be the
    /// same script.
    pub fn from_input_bytes_with_redeem_script(
        txinscript: &[u8],
        redeemscript: &[u8],
        signing_hash: Option<&[u8]>,
        clear_invalid_sigs: bool,
    ) -> Result<Self, ScriptError> {
        let mut script = Self::from_multisig(MultisigConfig::from_redeem_script(redeemscript)?);
        let mut items = read_all_pushes(txinscript)?;

        if let Some(last) = items.last() {
            if *last == redeemscript {
                items.pop();
            } else if MultisigConfig::from_redeem_script(last).is_ok() {
                return Err(ScriptError::malformed("embedded redeem script differs"));
            }
        }

        let sigs = match items.split_first() {
            None => &[][..],
            Some((dummy, sigs)) if dummy.is_empty() => sigs,
            Some(_) => return Err(ScriptError::malformed("multisig input lacks OP_0 dummy")),
        };

        with_fixed_hash(signing_hash, |check| script.fill_sigs(sigs, check, clear_invalid_sigs))?;
        Ok(script)
    }

    /// Parse an input against the output script it spends
    ///
    /// Pay-to-pubkey inputs can only be parsed this way, since the key lives
    /// in the output. For the hash templates the recovered key hash or
    /// script hash must match the output.
    pub fn from_input_bytes_for_output(
        txinscript: &[u8],
        output_script: &[u8],
        signing_hash: Option<&[u8]>,
        clear_invalid_sigs: bool,
    ) -> Result<Self, ScriptError> {
        with_fixed_hash(signing_hash, |check| {
            Self::from_input_bytes_for_output_checked(
                txinscript,
                output_script,
                check,
                clear_invalid_sigs,
            )
        })
    }

    /// Like `from_input_bytes_for_output`, with signatures verified by `check`
    pub fn from_input_bytes_for_output_checked(
        txinscript: &[u8],
        output_script: &[u8],
        check: Option<SigCheck<'_>>,
        clear_invalid_sigs: bool,
    ) -> Result<Self, ScriptError> {
        let payee = classify_output_script(output_script);
        let expected = match payee.script_type {
            ScriptType::PayToPubkey => {
                let mut script =
                    Self::from_template(TemplateType::PayToPubkey, 1, vec![payee.payload])
                        .map_err(|e| ScriptError::malformed(e.to_string()))?;
                let items = read_all_pushes(txinscript)?;
                if items.len() > 1 {
                    return Err(ScriptError::malformed(format!(
                        "pay-to-pubkey input has {} pushed items",
                        items.len()
                    )));
                }
                script.fill_sigs(&items, check, clear_invalid_sigs)?;
                return Ok(script);
            }
            ScriptType::PayToPubkeyHash => TemplateType::PayToPubkeyHash,
            ScriptType::PayToScriptHash => TemplateType::PayToMultisigScriptHash,
            other => return Err(ScriptError::UnsupportedScriptType(other)),
        };

        let script = Self::from_input_bytes_checked(txinscript, check, clear_invalid_sigs)?;
        if script.template != expected || script.hash != payee.payload {
            return Err(ScriptError::malformed(
                "input script does not satisfy the output it spends",
            ));
        }
        Ok(script)
    }

    /// Place raw signature items into slots, verifying them if a check is
    /// given
    fn fill_sigs(
        &mut self,
        raw: &[&[u8]],
        check: Option<SigCheck<'_>>,
        clear_invalid_sigs: bool,
    ) -> Result<(), ScriptError> {
        let n = self.pubkeys.len();
        if raw.len() > n {
            return Err(ScriptError::malformed(format!(
                "{} signature items for {} public keys",
                raw.len(),
                n
            )));
        }

        if raw.len() == n {
            for (index, sig) in raw.iter().enumerate() {
                if sig.is_empty() {
                    continue;
                }
                if let Some(check) = check {
                    if !check(&self.pubkeys[index], sig) {
                        self.reject_sig(index, clear_invalid_sigs)?;
                        continue;
                    }
                }
                self.sigs[index] = Some(sig.to_vec());
            }
            return Ok(());
        }

        let present: Vec<&[u8]> = raw.iter().copied().filter(|s| !s.is_empty()).collect();
        if present.is_empty() {
            return Ok(());
        }
        let Some(check) = check else {
            return Err(ScriptError::malformed(format!(
                "cannot align {} signature(s) with {} public keys without a signing hash",
                present.len(),
                n
            )));
        };

        // Signatures appear in key order, as OP_CHECKMULTISIG requires
        let mut next_key = 0;
        for (index, sig) in present.into_iter().enumerate() {
            let matched = (next_key..n).find(|&k| check(&self.pubkeys[k], sig));
            match matched {
                Some(k) => {
                    self.sigs[k] = Some(sig.to_vec());
                    next_key = k + 1;
                }
                None => self.reject_sig(index, clear_invalid_sigs)?,
            }
        }
        Ok(())
    }

    fn reject_sig(&self, index: usize, clear_invalid_sigs: bool) -> Result<(), ScriptError> {
        if clear_invalid_sigs {
            log::warn!("Clearing invalid signature {} in {:?} input", index, self.template);
            Ok(())
        } else {
            Err(ScriptError::InvalidSignature { index })
        }
    }

    pub fn template_type(&self) -> TemplateType {
        self.template
    }

    pub fn minsigs(&self) -> usize {
        self.minsigs
    }

    pub fn pubkeys(&self) -> &[Vec<u8>] {
        &self.pubkeys
    }

    pub fn sigs(&self) -> &[Option<Vec<u8>>] {
        &self.sigs
    }

    pub fn redeemscript(&self) -> &[u8] {
        &self.redeemscript
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Serialize the input script, failing in Broadcast mode while
    /// signatures are missing
    pub fn txinscript(&self, mode: SigMode) -> Result<Vec<u8>, ScriptError> {
        self.txinscript_with_policy(mode, BroadcastPolicy::RequireComplete)
    }

    /// Serialize the input script under an explicit broadcast policy
    pub fn txinscript_with_policy(
        &self,
        mode: SigMode,
        policy: BroadcastPolicy,
    ) -> Result<Vec<u8>, ScriptError> {
        if self.template == TemplateType::Unknown {
            return Err(ScriptError::template("cannot serialize an unknown template"));
        }

        let placeholders = match mode {
            SigMode::Sign => {
                return Ok(match self.template {
                    TemplateType::PayToMultisigScriptHash => self.redeemscript.clone(),
                    _ => self.txoutscript(),
                })
            }
            SigMode::Edit => true,
            SigMode::Broadcast => {
                let needed = self.sigsneeded();
                if needed > 0 && policy == BroadcastPolicy::RequireComplete {
                    return Err(ScriptError::IncompleteScript { needed });
                }
                false
            }
        };

        let mut script = Vec::new();
        if self.template == TemplateType::PayToMultisigScriptHash {
            script.push(OP_0);
        }

        let mut emitted = 0;
        for sig in &self.sigs {
            match sig {
                Some(sig) if placeholders || emitted < self.minsigs => {
                    script.extend(push_data(sig));
                    emitted += 1;
                }
                Some(_) => {}
                None if placeholders => script.push(OP_0),
                None => {}
            }
        }

        match self.template {
            TemplateType::PayToPubkeyHash => script.extend(push_data(&self.pubkeys[0])),
            TemplateType::PayToMultisigScriptHash => script.extend(push_data(&self.redeemscript)),
            _ => {}
        }
        Ok(script)
    }

    /// Output script this input spends, independent of signature state
    pub fn txoutscript(&self) -> Vec<u8> {
        match self.template {
            TemplateType::Unknown => Vec::new(),
            TemplateType::PayToPubkey => pay_to_pubkey_script(&self.pubkeys[0]),
            TemplateType::PayToPubkeyHash => pay_to_pubkey_hash_script(&self.hash),
            TemplateType::PayToMultisigScriptHash => pay_to_script_hash_script(&self.hash),
        }
    }

    /// Classification of `txoutscript()`
    pub fn payee(&self) -> Payee {
        let payload = match self.template {
            TemplateType::PayToPubkey => self.pubkeys[0].clone(),
            _ => self.hash.clone(),
        };
        Payee::new(self.template.output_type(), payload)
    }

    /// How many more signatures are needed to reach the threshold
    pub fn sigsneeded(&self) -> usize {
        let present = self.sigs.iter().filter(|s| s.is_some()).count();
        self.minsigs.saturating_sub(present)
    }

    pub fn is_complete(&self) -> bool {
        self.sigsneeded() == 0
    }

    /// Public keys whose signature is still missing, in key order
    pub fn missingsigs(&self) -> Vec<Vec<u8>> {
        self.partition_pubkeys(false)
    }

    /// Public keys that have signed, in key order
    pub fn presentsigs(&self) -> Vec<Vec<u8>> {
        self.partition_pubkeys(true)
    }

    fn partition_pubkeys(&self, signed: bool) -> Vec<Vec<u8>> {
        self.pubkeys
            .iter()
            .zip(&self.sigs)
            .filter(|(_, sig)| sig.is_some() == signed)
            .map(|(pubkey, _)| pubkey.clone())
            .collect()
    }

    /// Fill the slot of `pubkey`
    ///
    /// Returns false, leaving the script untouched, if the key is not part
    /// of the script, its slot is already filled, or `sig` is empty.
    pub fn add_sig(&mut self, pubkey: &[u8], sig: Vec<u8>) -> bool {
        if sig.is_empty() {
            return false;
        }
        match self.pubkeys.iter().position(|k| k == pubkey) {
            Some(index) if self.sigs[index].is_none() => {
                self.sigs[index] = Some(sig);
                true
            }
            _ => false,
        }
    }

    /// Reset every slot to a placeholder
    pub fn clear_sigs(&mut self) {
        self.sigs.iter_mut().for_each(|sig| *sig = None);
    }

    /// Copy signatures from another copy of the same script into empty slots
    ///
    /// Slots that are already filled are never overwritten. Returns the
    /// number of signatures copied.
    pub fn merge_sigs(&mut self, other: &Script) -> Result<usize, ScriptError> {
        if self.template != other.template
            || self.minsigs != other.minsigs
            || self.pubkeys != other.pubkeys
        {
            return Err(ScriptError::template(
                "cannot merge signatures from a different script",
            ));
        }

        let mut added = 0;
        for (mine, theirs) in self.sigs.iter_mut().zip(&other.sigs) {
            if mine.is_none() && theirs.is_some() {
                *mine = theirs.clone();
                added += 1;
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sha256, KeyPair};
    use crate::script::opcodes::OP_CHECKMULTISIG;

    fn keys(n: u8) -> Vec<KeyPair> {
        (1..=n)
            .map(|i| {
                let mut secret = [0u8; 32];
                secret[31] = i;
                KeyPair::from_private_key_hex(&hex::encode(secret)).unwrap()
            })
            .collect()
    }

    fn pubkeys(keys: &[KeyPair]) -> Vec<Vec<u8>> {
        keys.iter().map(|k| k.public_key_bytes()).collect()
    }

    fn signing_hash() -> Vec<u8> {
        sha256(b"transaction being signed")
    }

    fn two_of_three() -> (Script, Vec<KeyPair>) {
        let keys = keys(3);
        let script =
            Script::from_template(TemplateType::PayToMultisigScriptHash, 2, pubkeys(&keys))
                .unwrap();
        (script, keys)
    }

    fn sign(key: &KeyPair) -> Vec<u8> {
        key.sign(&signing_hash(), 0x01).unwrap()
    }

    #[test]
    fn test_two_of_three_scenario() {
        let (mut script, keys) = two_of_three();
        assert_eq!(script.sigsneeded(), 2);

        assert!(script.add_sig(&keys[1].public_key_bytes(), sign(&keys[1])));
        assert_eq!(script.sigsneeded(), 1);
        assert!(matches!(
            script.txinscript(SigMode::Broadcast),
            Err(ScriptError::IncompleteScript { needed: 1 })
        ));

        assert!(script.add_sig(&keys[0].public_key_bytes(), sign(&keys[0])));
        assert_eq!(script.sigsneeded(), 0);

        let broadcast = script.txinscript(SigMode::Broadcast).unwrap();
        let items = read_all_pushes(&broadcast).unwrap();
        assert_eq!(items.len(), 4);
        assert!(items[0].is_empty());
        assert_eq!(items[1], sign(&keys[0]).as_slice());
        assert_eq!(items[2], sign(&keys[1]).as_slice());
        assert_eq!(items[3], script.redeemscript());
    }

    #[test]
    fn test_single_key_templates() {
        let key = &keys(1)[0];
        let pkh = Script::from_template(TemplateType::PayToPubkeyHash, 7, vec![key.public_key_bytes()])
            .unwrap();
        assert_eq!(pkh.minsigs(), 1);
        assert_eq!(pkh.hash(), key.public_key_hash());
        assert!(pkh.redeemscript().is_empty());

        let pk = Script::from_template(TemplateType::PayToPubkey, 1, vec![key.public_key_bytes()])
            .unwrap();
        assert!(pk.hash().is_empty());

        let err = Script::from_template(TemplateType::PayToPubkey, 1, pubkeys(&keys(2)));
        assert!(matches!(err, Err(ScriptError::InvalidScriptTemplate(_))));
        let err = Script::from_template(TemplateType::Unknown, 1, vec![key.public_key_bytes()]);
        assert!(matches!(err, Err(ScriptError::InvalidScriptTemplate(_))));
    }

    #[test]
    fn test_multisig_arity() {
        let keys = keys(3);
        for m in [0, 4] {
            let err = Script::from_template(TemplateType::PayToMultisigScriptHash, m, pubkeys(&keys));
            assert!(matches!(err, Err(ScriptError::InvalidScriptTemplate(_))));
        }
    }

    #[test]
    fn test_with_sigs_length_checked() {
        let keys = keys(2);
        let err = Script::from_template_with_sigs(
            TemplateType::PayToMultisigScriptHash,
            1,
            pubkeys(&keys),
            vec![None],
        );
        assert!(matches!(err, Err(ScriptError::InvalidScriptTemplate(_))));

        let script = Script::from_template_with_sigs(
            TemplateType::PayToMultisigScriptHash,
            1,
            pubkeys(&keys),
            vec![Some(vec![]), Some(sign(&keys[1]))],
        )
        .unwrap();
        assert_eq!(script.presentsigs(), vec![keys[1].public_key_bytes()]);
    }

    #[test]
    fn test_output_round_trip() {
        let keys = keys(3);
        let scripts = [
            Script::from_template(TemplateType::PayToPubkey, 1, vec![keys[0].public_key_bytes()]),
            Script::from_template(TemplateType::PayToPubkeyHash, 1, vec![keys[0].public_key_bytes()]),
            Script::from_template(TemplateType::PayToMultisigScriptHash, 2, pubkeys(&keys)),
        ];
        for script in scripts {
            let script = script.unwrap();
            assert_eq!(classify_output_script(&script.txoutscript()), script.payee());
        }
    }

    #[test]
    fn test_sign_mode() {
        let (script, _) = two_of_three();
        assert_eq!(script.txinscript(SigMode::Sign).unwrap(), script.redeemscript());
        assert_eq!(*script.redeemscript().last().unwrap(), OP_CHECKMULTISIG);

        let key = &keys(1)[0];
        let pkh = Script::from_template(TemplateType::PayToPubkeyHash, 1, vec![key.public_key_bytes()])
            .unwrap();
        assert_eq!(pkh.txinscript(SigMode::Sign).unwrap(), pkh.txoutscript());
    }

    #[test]
    fn test_edit_round_trip_without_hash() {
        let (mut script, keys) = two_of_three();
        script.add_sig(&keys[2].public_key_bytes(), sign(&keys[2]));

        let edit = script.txinscript(SigMode::Edit).unwrap();
        let items = read_all_pushes(&edit).unwrap();
        assert_eq!(items.len(), 5);
        assert!(items[1].is_empty() && items[2].is_empty());

        let parsed = Script::from_input_bytes(&edit, None, false).unwrap();
        assert_eq!(parsed, script);
    }

    #[test]
    fn test_pubkey_hash_round_trip() {
        let key = &keys(1)[0];
        let mut script =
            Script::from_template(TemplateType::PayToPubkeyHash, 1, vec![key.public_key_bytes()])
                .unwrap();

        let unsigned = script.txinscript(SigMode::Edit).unwrap();
        assert_eq!(unsigned[0], OP_0);
        assert_eq!(Script::from_input_bytes(&unsigned, None, false).unwrap(), script);

        script.add_sig(&key.public_key_bytes(), sign(key));
        let hash = signing_hash();
        let broadcast = script.txinscript(SigMode::Broadcast).unwrap();
        let parsed = Script::from_input_bytes(&broadcast, Some(&hash), false).unwrap();
        assert_eq!(parsed, script);
        assert!(parsed.is_complete());
    }

    #[test]
    fn test_broadcast_form_aligned_with_hash() {
        let (mut script, keys) = two_of_three();
        script.add_sig(&keys[0].public_key_bytes(), sign(&keys[0]));
        script.add_sig(&keys[2].public_key_bytes(), sign(&keys[2]));
        let broadcast = script.txinscript(SigMode::Broadcast).unwrap();

        // Slots cannot be aligned without verifying
        assert!(matches!(
            Script::from_input_bytes(&broadcast, None, false),
            Err(ScriptError::MalformedScript(_))
        ));

        let hash = signing_hash();
        let parsed = Script::from_input_bytes(&broadcast, Some(&hash), false).unwrap();
        assert_eq!(parsed, script);
        assert_eq!(parsed.missingsigs(), vec![keys[1].public_key_bytes()]);
    }

    #[test]
    fn test_broadcast_caps_at_threshold() {
        let (mut script, keys) = two_of_three();
        for key in &keys {
            script.add_sig(&key.public_key_bytes(), sign(key));
        }
        let items_len = read_all_pushes(&script.txinscript(SigMode::Broadcast).unwrap())
            .unwrap()
            .len();
        assert_eq!(items_len, 1 + 2 + 1);
    }

    #[test]
    fn test_partial_broadcast_policy() {
        let (mut script, keys) = two_of_three();
        script.add_sig(&keys[1].public_key_bytes(), sign(&keys[1]));
        let partial = script
            .txinscript_with_policy(SigMode::Broadcast, BroadcastPolicy::AllowPartial)
            .unwrap();
        assert_eq!(read_all_pushes(&partial).unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_signatures() {
        let (mut script, keys) = two_of_three();
        // keys[0]'s signature placed in keys[1]'s slot
        script.sigs[1] = Some(sign(&keys[0]));
        script.sigs[2] = Some(sign(&keys[2]));
        let edit = script.txinscript(SigMode::Edit).unwrap();
        let hash = signing_hash();

        assert_eq!(
            Script::from_input_bytes(&edit, Some(&hash), false),
            Err(ScriptError::InvalidSignature { index: 1 })
        );

        let cleared = Script::from_input_bytes(&edit, Some(&hash), true).unwrap();
        assert_eq!(cleared.presentsigs(), vec![keys[2].public_key_bytes()]);

        // Without a hash nothing is checked
        assert_eq!(Script::from_input_bytes(&edit, None, false).unwrap(), script);
    }

    #[test]
    fn test_checked_against_declared_type() {
        let (mut script, keys) = two_of_three();
        let all_hash = signing_hash();
        let acp_hash = sha256(b"anyone can pay digest");
        script.sigs[0] = Some(keys[0].sign(&acp_hash, 0x81).unwrap());
        script.sigs[2] = Some(keys[2].sign(&all_hash, 0x01).unwrap());
        let broadcast = script.txinscript(SigMode::Broadcast).unwrap();

        let check: SigCheck<'_> = &|pubkey: &[u8], sig: &[u8]| match sig.last() {
            Some(0x81) => verify_signature(pubkey, &acp_hash, sig),
            Some(0x01) => verify_signature(pubkey, &all_hash, sig),
            _ => false,
        };
        let parsed = Script::from_input_bytes_checked(&broadcast, Some(check), false).unwrap();
        assert_eq!(parsed, script);

        // A single fixed hash only verifies the signature made over it
        assert!(Script::from_input_bytes(&broadcast, Some(&all_hash), false).is_err());
    }

    #[test]
    fn test_malformed_inputs() {
        for bytes in [
            vec![],
            vec![0xac],
            vec![0x05, 0x01],
            vec![0x01, 0xaa],
            vec![0x00, 0x01, 0xaa, 0x01, 0x51],
        ] {
            assert!(
                matches!(Script::from_input_bytes(&bytes, None, false), Err(ScriptError::MalformedScript(_))),
                "accepted {:?}",
                bytes
            );
        }
    }

    #[test]
    fn test_add_sig_rules() {
        let (mut script, keys) = two_of_three();
        let pk = keys[0].public_key_bytes();

        assert!(!script.add_sig(&[0x02; 33], sign(&keys[0])));
        assert!(!script.add_sig(&pk, vec![]));
        assert!(script.add_sig(&pk, sign(&keys[0])));

        let before = script.clone();
        assert!(!script.add_sig(&pk, vec![0x30, 0x00]));
        assert_eq!(script, before);
    }

    #[test]
    fn test_clear_sigs_idempotent() {
        let (mut script, keys) = two_of_three();
        script.add_sig(&keys[0].public_key_bytes(), sign(&keys[0]));
        script.clear_sigs();
        let once = script.clone();
        script.clear_sigs();
        assert_eq!(script, once);
        assert_eq!(script.sigsneeded(), 2);
        assert_eq!(script.missingsigs().len(), 3);
    }

    #[test]
    fn test_merge_is_monotonic() {
        let (mut a, keys) = two_of_three();
        let mut b = a.clone();

        a.add_sig(&keys[0].public_key_bytes(), sign(&keys[0]));
        b.add_sig(&keys[0].public_key_bytes(), vec![0x30, 0x01]);
        b.add_sig(&keys[2].public_key_bytes(), sign(&keys[2]));

        let before = a.presentsigs();
        assert_eq!(a.merge_sigs(&b).unwrap(), 1);
        assert!(before.iter().all(|pk| a.presentsigs().contains(pk)));
        // First writer wins
        assert_eq!(a.sigs()[0], Some(sign(&keys[0])));
        assert_eq!(a.merge_sigs(&b).unwrap(), 0);
        assert!(a.is_complete());
    }

    #[test]
    fn test_merge_rejects_other_template() {
        let (mut a, keys) = two_of_three();
        let other =
            Script::from_template(TemplateType::PayToMultisigScriptHash, 1, pubkeys(&keys)).unwrap();
        assert!(a.merge_sigs(&other).is_err());
    }

    #[test]
    fn test_threshold_accounting() {
        let keys = keys(4);
        for m in 1..=4 {
            let mut script =
                Script::from_template(TemplateType::PayToMultisigScriptHash, m, pubkeys(&keys))
                    .unwrap();
            for (signed, key) in keys.iter().enumerate() {
                let present = script.presentsigs().len();
                assert_eq!(present, signed);
                if present <= m {
                    assert_eq!(script.sigsneeded() + present, m);
                } else {
                    assert_eq!(script.sigsneeded(), 0);
                }
                script.add_sig(&key.public_key_bytes(), sign(key));
            }
            assert_eq!(script.sigsneeded(), 0);
        }
    }

    #[test]
    fn test_redeem_script_out_of_band() {
        let (mut script, keys) = two_of_three();
        let redeem = script.redeemscript().to_vec();

        // Nothing signed yet: an empty input resolves to all placeholders
        let empty = Script::from_input_bytes_with_redeem_script(&[], &redeem, None, false).unwrap();
        assert_eq!(empty, script);

        script.add_sig(&keys[1].public_key_bytes(), sign(&keys[1]));
        let mut stripped = vec![OP_0];
        stripped.extend(push_data(&sign(&keys[1])));

        let hash = signing_hash();
        let parsed =
            Script::from_input_bytes_with_redeem_script(&stripped, &redeem, Some(&hash), false)
                .unwrap();
        assert_eq!(parsed, script);

        // Embedded script must agree
        let edit = script.txinscript(SigMode::Edit).unwrap();
        assert_eq!(
            Script::from_input_bytes_with_redeem_script(&edit, &redeem, None, false).unwrap(),
            script
        );
        let other = Script::from_template(TemplateType::PayToMultisigScriptHash, 1, pubkeys(&keys))
            .unwrap();
        assert!(Script::from_input_bytes_with_redeem_script(&edit, other.redeemscript(), None, false)
            .is_err());
    }

    #[test]
    fn test_parse_for_output() {
        let key = &keys(1)[0];
        let hash = signing_hash();

        // Pay-to-pubkey: key comes from the output
        let mut pk = Script::from_template(TemplateType::PayToPubkey, 1, vec![key.public_key_bytes()])
            .unwrap();
        let out = pk.txoutscript();
        assert_eq!(Script::from_input_bytes_for_output(&[], &out, None, false).unwrap(), pk);
        pk.add_sig(&key.public_key_bytes(), sign(key));
        let input = pk.txinscript(SigMode::Broadcast).unwrap();
        assert_eq!(
            Script::from_input_bytes_for_output(&input, &out, Some(&hash), false).unwrap(),
            pk
        );

        // Pubkey-hash input spending the wrong output
        let pkh = Script::from_template(TemplateType::PayToPubkeyHash, 1, vec![key.public_key_bytes()])
            .unwrap();
        let edit = pkh.txinscript(SigMode::Edit).unwrap();
        assert_eq!(
            Script::from_input_bytes_for_output(&edit, &pkh.txoutscript(), None, false).unwrap(),
            pkh
        );
        let wrong = pay_to_pubkey_hash_script(&[0u8; 20]);
        assert!(matches!(
            Script::from_input_bytes_for_output(&edit, &wrong, None, false),
            Err(ScriptError::MalformedScript(_))
        ));

        assert!(matches!(
            Script::from_input_bytes_for_output(&edit, &[0x6a], None, false),
            Err(ScriptError::UnsupportedScriptType(ScriptType::Unknown))
        ));
    }
}
