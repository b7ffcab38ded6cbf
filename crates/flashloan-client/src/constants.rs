//! Constants shared between the on-chain program and clients.
//!
//! Keep the seeds and sizes stable because they affect address derivation
//! and the accounts the program expects.

/// Seed of the initializer account.
pub const SEED_INITIALIZER: &str = "hello1";

/// Seed of the flashloan token account.
pub const SEED_FLASHLOAN_TOKEN: &str = "hello2";

/// Seed of the flashloan program state account.
pub const SEED_FLASHLOAN_PROGRAM: &str = "hello3";

/// Seed of the token program account.
pub const SEED_TOKEN_PROGRAM: &str = "hello4";

/// Seeds in declaration order. This order is part of the instruction wire
/// contract.
pub const ACCOUNT_SEEDS: [&str; 4] = [
    SEED_INITIALIZER,
    SEED_FLASHLOAN_TOKEN,
    SEED_FLASHLOAN_PROGRAM,
    SEED_TOKEN_PROGRAM,
];

/// Data size of every seeded account, in bytes.
pub const ACCOUNT_SIZE: usize = 100;

/// Number of signatures budgeted when funding the payer.
pub const FEE_SIGNATURE_BUDGET: u64 = 100;

/// Directory holding the built program and its keypair.
pub const PROGRAM_DIR: &str = "dist/program";

/// Shared object produced by the program build.
pub const PROGRAM_SO_NAME: &str = "solana_flashloan_template.so";

/// Keypair written by `solana program deploy`.
pub const PROGRAM_KEYPAIR_NAME: &str = "solana_flashloan_template-keypair.json";

/// RPC endpoint used when no config file names one.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";

/// Solana CLI config location, relative to the home directory.
pub const CLI_CONFIG_RELATIVE_PATH: &str = ".config/solana/cli/config.yml";

/// Payer keypair location, relative to the home directory.
pub const DEFAULT_KEYPAIR_RELATIVE_PATH: &str = ".config/solana/id.json";
