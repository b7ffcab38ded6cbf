//! Error taxonomy for provisioning and dispatch.
//!
//! Every variant names the address involved so a failing pipeline step can be
//! reported precisely. Nothing in this crate recovers from these locally.

use solana_program::pubkey::Pubkey;
use thiserror::Error;

use crate::network::NetworkFailure;

pub type FlashloanResult<T> = Result<T, FlashloanError>;

#[derive(Debug, Error)]
pub enum FlashloanError {
    /// Missing or unreadable identity (keypair files, config file, program id).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid seed {seed:?}: {reason}")]
    InvalidSeed { seed: String, reason: String },

    #[error("program {program_id} {hint}")]
    ProgramNotDeployed { program_id: Pubkey, hint: String },

    #[error("program {program_id} is not executable")]
    ProgramNotExecutable { program_id: Pubkey },

    #[error("payer {payer} cannot fund {address}: {detail}")]
    InsufficientFunds {
        payer: Pubkey,
        address: Pubkey,
        detail: String,
    },

    #[error("network error at {address}: {source}")]
    Network {
        address: Pubkey,
        #[source]
        source: NetworkFailure,
    },

    #[error("creation of {address} rejected: {reason}")]
    CreationRejected { address: Pubkey, reason: String },

    #[error("account {address} not found")]
    AccountNotFound { address: Pubkey },

    #[error("program {program_id} rejected the instruction: {reason}")]
    Rejected { program_id: Pubkey, reason: String },

    #[error("provisioning interrupted: {0}")]
    Interrupted(String),
}

impl FlashloanError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_seed(seed: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSeed {
            seed: seed.to_string(),
            reason: reason.into(),
        }
    }

    pub fn network(address: Pubkey, source: NetworkFailure) -> Self {
        Self::Network { address, source }
    }

    pub fn insufficient_funds(payer: Pubkey, address: Pubkey, detail: impl Into<String>) -> Self {
        Self::InsufficientFunds {
            payer,
            address,
            detail: detail.into(),
        }
    }

    /// The address the failure concerns.
    pub fn address(&self) -> Option<Pubkey> {
        match self {
            Self::ProgramNotDeployed { program_id, .. }
            | Self::ProgramNotExecutable { program_id }
            | Self::Rejected { program_id, .. } => Some(*program_id),
            Self::InsufficientFunds { address, .. }
            | Self::Network { address, .. }
            | Self::CreationRejected { address, .. }
            | Self::AccountNotFound { address } => Some(*address),
            Self::Configuration(_) | Self::InvalidSeed { .. } | Self::Interrupted(_) => None,
        }
    }
}
