//! coinscript CLI Application
//!
//! Classifies and builds output scripts, converts addresses, and signs
//! transactions (including incremental multisig signing).

use clap::{Parser, Subcommand, ValueEnum};
use coin_script::cli;
use coin_script::config::Config;
use coin_script::script::Network;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coinscript")]
#[command(version = "0.1.0")]
#[command(about = "Script templates, addresses and multisig signing", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network whose address versions to use (overrides the config file)
    #[arg(short, long, global = true, value_enum)]
    network: Option<NetworkArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum NetworkArg {
    Mainnet,
    Testnet,
}

impl From<NetworkArg> for Network {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Mainnet => Network::Mainnet,
            NetworkArg::Testnet => Network::Testnet,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an output script
    Classify {
        /// Output script (hex)
        script: String,
    },

    /// Convert an address to the output script paying to it
    AddressToScript {
        address: String,
    },

    /// Convert an output script to its address
    ScriptToAddress {
        /// Output script (hex)
        script: String,
    },

    /// Check whether an address is valid for the network
    ValidateAddress {
        address: String,
    },

    /// Build an M-of-N multisig redeem script and address
    Multisig {
        /// Required signatures (M)
        #[arg(short, long)]
        threshold: usize,

        /// Public keys (hex), in redeem script order
        #[arg(required = true)]
        pubkeys: Vec<String>,
    },

    /// Show the signature state of an input script
    InspectInput {
        /// Input script (hex)
        script: String,

        /// Redeem script (hex) when the input does not embed it
        #[arg(long)]
        redeem_script: Option<String>,

        /// Output script (hex) spent by the input
        #[arg(long, conflicts_with = "redeem_script")]
        prevout: Option<String>,
    },

    /// Sign a transaction
    Sign {
        /// Transaction (hex)
        #[arg(long)]
        tx: String,

        /// Private keys (WIF or hex)
        #[arg(short, long = "key", required = true)]
        keys: Vec<String>,

        /// Output scripts (hex) spent by each input, in input order
        #[arg(long = "prevout")]
        prevouts: Vec<String>,

        /// Drop invalid signatures instead of failing
        #[arg(long)]
        clear_invalid: bool,
    },

    /// Generate a new key pair
    Keygen,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(network) = cli.network {
        config.network = network.into();
    }

    match cli.command {
        Commands::Classify { script } => {
            cli::cmd_classify(&script)?;
        }
        Commands::AddressToScript { address } => {
            cli::cmd_address_to_script(&config, &address)?;
        }
        Commands::ScriptToAddress { script } => {
            cli::cmd_script_to_address(&config, &script)?;
        }
        Commands::ValidateAddress { address } => {
            cli::cmd_validate_address(&config, &address)?;
        }
        Commands::Multisig { threshold, pubkeys } => {
            cli::cmd_multisig(&config, threshold, &pubkeys)?;
        }
        Commands::InspectInput {
            script,
            redeem_script,
            prevout,
        } => {
            cli::cmd_inspect_input(&script, redeem_script.as_deref(), prevout.as_deref())?;
        }
        Commands::Sign {
            tx,
            keys,
            prevouts,
            clear_invalid,
        } => {
            cli::cmd_sign(&config, &tx, &keys, &prevouts, clear_invalid)?;
        }
        Commands::Keygen => {
            cli::cmd_keygen(&config)?;
        }
    }

    Ok(())
}
