//! Account descriptors and provisioned account state.

use serde::Serialize;
use solana_program::pubkey::Pubkey;
use solana_sdk::account::Account;

use crate::constants::{ACCOUNT_SEEDS, ACCOUNT_SIZE};
use crate::errors::FlashloanResult;
use crate::seed::derive_address;

/// One account the program expects, described by its seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDescriptor {
    pub seed: String,
    pub size_bytes: usize,
    pub owning_program: Pubkey,
}

impl AccountDescriptor {
    pub fn new(seed: impl Into<String>, size_bytes: usize, owning_program: Pubkey) -> Self {
        Self {
            seed: seed.into(),
            size_bytes,
            owning_program,
        }
    }

    /// Address of this account under `base`.
    pub fn address(&self, base: &Pubkey) -> FlashloanResult<Pubkey> {
        derive_address(base, &self.seed, &self.owning_program)
    }
}

/// The four seeded accounts of the flashloan program, in declaration order.
pub fn default_descriptors(program_id: &Pubkey) -> Vec<AccountDescriptor> {
    ACCOUNT_SEEDS
        .iter()
        .map(|seed| AccountDescriptor::new(*seed, ACCOUNT_SIZE, *program_id))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionStatus {
    /// Created by this call.
    Created,
    /// Already on chain; left untouched.
    Existing,
}

/// On-chain state of a seeded account after provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAccount {
    pub seed: String,
    pub address: Pubkey,
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
    pub executable: bool,
    pub status: ProvisionStatus,
}

impl ProvisionedAccount {
    pub fn from_account(seed: &str, address: Pubkey, account: Account, status: ProvisionStatus) -> Self {
        Self {
            seed: seed.to_string(),
            address,
            lamports: account.lamports,
            owner: account.owner,
            data: account.data,
            executable: account.executable,
            status,
        }
    }
}
