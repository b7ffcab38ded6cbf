use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flashloan_client::SEED_FLASHLOAN_PROGRAM;
use solana_sdk::pubkey::Pubkey;

#[derive(Parser, Debug, Clone)]
#[command(name = "flashloan", version, about = "Flashloan program client")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Solana CLI config file (default: ~/.config/solana/cli/config.yml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// RPC URL or cluster moniker (localhost, devnet, testnet, mainnet-beta).
    #[arg(long, short = 'u', global = true)]
    pub url: Option<String>,

    /// Fee payer keypair file.
    #[arg(long, global = true)]
    pub keypair: Option<PathBuf>,

    /// Program keypair written at deploy time.
    #[arg(long, global = true)]
    pub program_keypair: Option<PathBuf>,

    /// Program address, instead of reading the program keypair.
    #[arg(long, global = true)]
    pub program_id: Option<Pubkey>,

    /// Run against an in-memory ledger with a throwaway payer and program.
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the seeded account addresses without touching the network.
    Derive {
        /// Seeds to derive (default: the program's account seeds).
        #[arg(long = "seed")]
        seeds: Vec<String>,
    },

    #[command(flatten)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Connect, check the program and fund the payer.
    Establish,

    /// Create any missing seeded accounts.
    Provision {
        /// Provision the accounts concurrently.
        #[arg(long)]
        concurrent: bool,
    },

    /// Send the program's Init instruction.
    Init,

    /// Print the raw data of an account.
    Report {
        #[arg(long, conflicts_with = "seed")]
        address: Option<Pubkey>,
        #[arg(long, default_value = SEED_FLASHLOAN_PROGRAM)]
        seed: String,
    },

    /// Establish, provision, init and report in one go.
    Run {
        #[arg(long)]
        concurrent: bool,
    },
}
