//! Network boundary.
//!
//! `NetworkClient` is the only way the provisioner, dispatcher and reporter
//! reach the cluster. Retries, timeouts and confirmation policy belong to the
//! implementation, never to the callers.

use std::future::Future;

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_program::pubkey::Pubkey;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::message::Message;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};
use thiserror::Error;
use tracing::debug;

pub type NetworkResult<T> = Result<T, NetworkFailure>;

/// Failure reported by a `NetworkClient`.
#[derive(Debug, Clone, Error)]
pub enum NetworkFailure {
    /// RPC or transport failure. Nothing is known about the ledger outcome.
    #[error("rpc transport failure: {0}")]
    Transport(String),

    /// The cluster rejected or failed the transaction.
    #[error("transaction failed: {0}")]
    Transaction(TransactionError),
}

impl From<ClientError> for NetworkFailure {
    fn from(err: ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => Self::Transaction(tx_err),
            None => Self::Transport(err.to_string()),
        }
    }
}

/// Cluster parameters needed to build and fund transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParameters {
    pub blockhash: Hash,
    pub lamports_per_signature: u64,
}

pub trait NetworkClient: Send + Sync {
    /// Node software version, for display.
    fn version(&self) -> impl Future<Output = NetworkResult<String>> + Send;

    fn protocol_parameters(&self) -> impl Future<Output = NetworkResult<ProtocolParameters>> + Send;

    fn minimum_balance_for_rent_exemption(&self, size: usize) -> impl Future<Output = NetworkResult<u64>> + Send;

    fn balance(&self, address: &Pubkey) -> impl Future<Output = NetworkResult<u64>> + Send;

    /// `None` when no account lives at `address`.
    fn account_info(&self, address: &Pubkey) -> impl Future<Output = NetworkResult<Option<Account>>> + Send;

    /// Request an airdrop and wait until it lands.
    fn request_funds(&self, address: &Pubkey, lamports: u64) -> impl Future<Output = NetworkResult<Signature>> + Send;

    /// Submit a signed transaction and wait for confirmation.
    fn submit_and_confirm(&self, transaction: &Transaction) -> impl Future<Output = NetworkResult<Signature>> + Send;
}

/// `NetworkClient` backed by the Solana JSON-RPC API.
pub struct RpcNetworkClient {
    rpc: RpcClient,
}

impl RpcNetworkClient {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

impl NetworkClient for RpcNetworkClient {
    async fn version(&self) -> NetworkResult<String> {
        let version = self.rpc.get_version().await?;
        Ok(version.solana_core)
    }

    async fn protocol_parameters(&self) -> NetworkResult<ProtocolParameters> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        // Fee of a message with a single required signature.
        let fee_message = Message::new_with_blockhash(&[], Some(&Pubkey::default()), &blockhash);
        let lamports_per_signature = self.rpc.get_fee_for_message(&fee_message).await?;
        Ok(ProtocolParameters {
            blockhash,
            lamports_per_signature,
        })
    }

    async fn minimum_balance_for_rent_exemption(&self, size: usize) -> NetworkResult<u64> {
        Ok(self.rpc.get_minimum_balance_for_rent_exemption(size).await?)
    }

    async fn balance(&self, address: &Pubkey) -> NetworkResult<u64> {
        Ok(self.rpc.get_balance(address).await?)
    }

    async fn account_info(&self, address: &Pubkey) -> NetworkResult<Option<Account>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value)
    }

    async fn request_funds(&self, address: &Pubkey, lamports: u64) -> NetworkResult<Signature> {
        let signature = self.rpc.request_airdrop(address, lamports).await?;
        debug!(%signature, %address, lamports, "airdrop requested");
        self.rpc.poll_for_signature(&signature).await?;
        Ok(signature)
    }

    async fn submit_and_confirm(&self, transaction: &Transaction) -> NetworkResult<Signature> {
        Ok(self.rpc.send_and_confirm_transaction(transaction).await?)
    }
}
