//! CLI commands for coinscript
//!
//! Implements all command handlers for the CLI interface.

use secp256k1::SecretKey;

use crate::config::Config;
use crate::core::Transaction;
use crate::crypto::{KeyPair, WIF_MAINNET, WIF_TESTNET};
use crate::multisig::MultisigConfig;
use crate::script::{
    address_to_output_script, classify_output_script, is_valid_address, output_script_to_address,
    pay_to_script_hash_script, Network, Script, ScriptType, SigMode, TemplateType,
};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Decode a hex argument, naming it in the error
pub fn parse_hex(what: &str, value: &str) -> CliResult<Vec<u8>> {
    hex::decode(value.trim()).map_err(|e| format!("invalid {} hex: {}", what, e).into())
}

/// Parse a private key given in WIF or as 64 hex characters
pub fn parse_private_key(value: &str) -> CliResult<SecretKey> {
    let value = value.trim();
    let key_pair = if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        KeyPair::from_private_key_hex(value)?
    } else {
        KeyPair::from_wif(value)?
    };
    Ok(key_pair.secret_key)
}

fn wif_version(network: Network) -> u8 {
    match network {
        Network::Mainnet => WIF_MAINNET,
        Network::Testnet => WIF_TESTNET,
    }
}

fn print_script_state(script: &Script) {
    println!("   ├─ Template: {:?}", script.template_type());
    println!(
        "   ├─ Requires: {}-of-{}",
        script.minsigs(),
        script.pubkeys().len()
    );
    for pubkey in script.presentsigs() {
        println!("   ├─ Signed:  {}", hex::encode(pubkey));
    }
    for pubkey in script.missingsigs() {
        println!("   ├─ Missing: {}", hex::encode(pubkey));
    }
    println!("   └─ Signatures needed: {}", script.sigsneeded());
}

/// Classify an output script
pub fn cmd_classify(script_hex: &str) -> CliResult<()> {
    let script = parse_hex("script", script_hex)?;
    let payee = classify_output_script(&script);

    println!("📜 Output script");
    println!("   ├─ Type: {}", payee.script_type.type_name());
    if payee.payload.is_empty() {
        println!("   └─ Payload: (none)");
    } else {
        println!("   └─ Payload: {}", hex::encode(&payee.payload));
    }
    Ok(())
}

/// Print the output script paying to an address
pub fn cmd_address_to_script(config: &Config, address: &str) -> CliResult<()> {
    let script = address_to_output_script(address, &config.address_versions())?;
    println!("{}", hex::encode(script));
    Ok(())
}

/// Print the address an output script pays to
pub fn cmd_script_to_address(config: &Config, script_hex: &str) -> CliResult<()> {
    let script = parse_hex("script", script_hex)?;
    let address = output_script_to_address(&script, &config.address_versions())?;
    println!("{}", address);
    Ok(())
}

/// Check an address against the configured network
pub fn cmd_validate_address(config: &Config, address: &str) -> CliResult<()> {
    let versions = config.address_versions();
    if is_valid_address(address, &versions) {
        let script = address_to_output_script(address, &versions)?;
        let payee = classify_output_script(&script);
        println!("✅ Valid {} address", payee.script_type.type_name());
    } else {
        println!("❌ Invalid address for {:?}", config.network);
    }
    Ok(())
}

/// Build an M-of-N multisig redeem script and its address
pub fn cmd_multisig(config: &Config, threshold: usize, pubkeys: &[String]) -> CliResult<()> {
    let pubkeys = pubkeys
        .iter()
        .map(|pk| parse_hex("public key", pk))
        .collect::<CliResult<Vec<_>>>()?;

    let multisig = MultisigConfig::new(threshold, pubkeys)?;
    let output = pay_to_script_hash_script(&multisig.script_hash());
    let address = output_script_to_address(&output, &config.address_versions())?;

    println!("🔐 {} multisig", multisig.description());
    println!("   ├─ Redeem script: {}", hex::encode(multisig.redeem_script()));
    println!("   ├─ Output script: {}", hex::encode(&output));
    println!("   └─ Address: {}", address);
    Ok(())
}

/// Parse an input script and report its signature state
///
/// Signatures are not verified, since no transaction is available.
pub fn cmd_inspect_input(
    script_hex: &str,
    redeem_script: Option<&str>,
    prevout: Option<&str>,
) -> CliResult<()> {
    let bytes = parse_hex("input script", script_hex)?;

    let script = match (redeem_script, prevout) {
        (Some(redeem), _) => {
            let redeem = parse_hex("redeem script", redeem)?;
            Script::from_input_bytes_with_redeem_script(&bytes, &redeem, None, false)?
        }
        (None, Some(prevout)) => {
            let prevout = parse_hex("previous output", prevout)?;
            Script::from_input_bytes_for_output(&bytes, &prevout, None, false)?
        }
        (None, None) => Script::from_input_bytes(&bytes, None, false)?,
    };

    println!("🔎 Input script");
    print_script_state(&script);
    if script.template_type() == TemplateType::PayToMultisigScriptHash {
        println!("   Redeem script: {}", hex::encode(script.redeemscript()));
    }
    println!("   Spends: {}", hex::encode(script.txoutscript()));
    if script.payee().script_type != ScriptType::Unknown && !script.is_complete() {
        println!("   Edit form: {}", hex::encode(script.txinscript(SigMode::Edit)?));
    }
    Ok(())
}

/// Sign a transaction with one or more private keys
///
/// `prevouts`, when given, must list the output script spent by every
/// input in order.
pub fn cmd_sign(
    config: &Config,
    tx_hex: &str,
    keys: &[String],
    prevouts: &[String],
    clear_invalid: bool,
) -> CliResult<()> {
    let tx = Transaction::from_hex(tx_hex)?;
    let secrets = keys
        .iter()
        .map(|key| parse_private_key(key))
        .collect::<CliResult<Vec<_>>>()?;

    let mut signer = config.signer();
    if prevouts.is_empty() {
        signer.set_tx(tx, clear_invalid)?;
    } else {
        let prevouts = prevouts
            .iter()
            .map(|p| parse_hex("previous output", p))
            .collect::<CliResult<Vec<_>>>()?;
        signer.set_tx_with_prevouts(tx, &prevouts, clear_invalid)?;
    }

    let signed = signer.sign(&secrets)?;

    println!("✍️  Added {} signature(s)", signed.len());
    for pubkey in &signed {
        println!("   ├─ {}", hex::encode(pubkey));
    }
    for (index, script) in signer.scripts().iter().enumerate() {
        println!(
            "   ├─ Input {}: {} more signature(s) needed",
            index,
            script.sigsneeded()
        );
    }
    println!(
        "   └─ Complete: {}",
        if signer.is_signed() { "yes" } else { "no" }
    );
    println!("{}", signer.tx().to_hex());
    Ok(())
}

/// Generate a new key pair
pub fn cmd_keygen(config: &Config) -> CliResult<()> {
    let key_pair = KeyPair::generate();
    let versions = config.address_versions();

    println!("🔑 New key pair");
    println!("   ├─ WIF: {}", key_pair.to_wif(wif_version(config.network)));
    println!("   ├─ Public key: {}", key_pair.public_key_hex());
    println!("   └─ Address: {}", key_pair.address(versions.pubkey_hash));
    Ok(())
}
