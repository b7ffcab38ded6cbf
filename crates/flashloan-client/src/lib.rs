//! flashloan-client
//!
//! This crate provides a small, focused Rust client for provisioning and
//! driving the seeded accounts of the flashloan on-chain program.
//!
//! It includes:
//! - seeded address derivation (`create_with_seed` scheme)
//! - the declarative set of account descriptors the program expects
//! - an idempotent account provisioner
//! - instruction encoding and a dispatcher with a fixed account order
//! - a raw account reporter
//! - identity loading (Solana CLI config, payer and program keypairs)
//! - a `NetworkClient` boundary with an RPC adapter and an in-memory ledger
//!
//! Note: the on-chain program is opaque to this crate. It is identified only
//! by its deployed address.

pub mod constants;
pub mod context;
pub mod descriptor;
pub mod dispatch;
pub mod errors;
pub mod funding;
pub mod identity;
pub mod instruction;
pub mod memory;
pub mod network;
pub mod provision;
pub mod report;
pub mod seed;

pub use constants::*;
pub use context::FlashloanContext;
pub use descriptor::{default_descriptors, AccountDescriptor, ProvisionStatus, ProvisionedAccount};
pub use dispatch::{build_instruction, dispatch};
pub use errors::{FlashloanError, FlashloanResult};
pub use identity::{Identity, IdentitySource};
pub use instruction::{FlashloanInstruction, InstructionCall};
pub use network::{NetworkClient, NetworkFailure, NetworkResult, ProtocolParameters, RpcNetworkClient};
pub use provision::{ensure_account, provision_all, provision_all_concurrent};
pub use report::read_account;
pub use seed::derive_address;
