//! Session context threaded through the pipeline operations.
//!
//! `establish` connects, verifies the program and funds the payer once; the
//! other operations reuse the resulting context. There is no global state.

use std::sync::Arc;

use solana_program::pubkey::Pubkey;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::signature::{Keypair, Signature, Signer};
use tracing::info;

use crate::descriptor::{default_descriptors, AccountDescriptor, ProvisionedAccount};
use crate::dispatch::dispatch;
use crate::errors::{FlashloanError, FlashloanResult};
use crate::funding::{check_program, fund_payer, required_funding};
use crate::identity::Identity;
use crate::instruction::FlashloanInstruction;
use crate::network::NetworkClient;
use crate::provision::{provision_all, provision_all_concurrent};
use crate::report::read_account;

pub struct FlashloanContext<C> {
    client: Arc<C>,
    payer: Arc<Keypair>,
    program_id: Pubkey,
    descriptors: Vec<AccountDescriptor>,
    node_version: String,
    payer_balance: u64,
}

impl<C: NetworkClient + 'static> FlashloanContext<C> {
    /// Connect, check the program and fund the payer for whatever part of
    /// the default descriptor set is not on chain yet.
    pub async fn establish(client: C, identity: Identity) -> FlashloanResult<Self> {
        let descriptors = default_descriptors(&identity.program_id);
        Self::establish_with(client, identity, descriptors).await
    }

    pub async fn establish_with(
        client: C,
        identity: Identity,
        descriptors: Vec<AccountDescriptor>,
    ) -> FlashloanResult<Self> {
        let payer_key = identity.payer.pubkey();
        let node_version = client
            .version()
            .await
            .map_err(|e| FlashloanError::network(identity.program_id, e))?;
        info!(rpc_url = %identity.rpc_url, version = %node_version, "connection to cluster established");

        check_program(&client, &identity.program_id, identity.program_so_path.as_deref()).await?;

        let required = required_funding(&client, &payer_key, &descriptors).await?;
        let payer_balance = fund_payer(&client, &payer_key, required).await?;
        info!(payer = %payer_key, sol = lamports_to_sol(payer_balance), "using account to pay for fees");

        Ok(Self {
            client: Arc::new(client),
            payer: Arc::new(identity.payer),
            program_id: identity.program_id,
            descriptors,
            node_version,
            payer_balance,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn descriptors(&self) -> &[AccountDescriptor] {
        &self.descriptors
    }

    pub fn node_version(&self) -> &str {
        &self.node_version
    }

    /// Payer balance observed after funding.
    pub fn payer_balance(&self) -> u64 {
        self.payer_balance
    }

    /// Addresses of the descriptor accounts, in declaration order.
    pub fn account_addresses(&self) -> FlashloanResult<Vec<Pubkey>> {
        let base = self.payer.pubkey();
        self.descriptors.iter().map(|d| d.address(&base)).collect()
    }

    /// Address of the descriptor with `seed`.
    pub fn address_for_seed(&self, seed: &str) -> FlashloanResult<Pubkey> {
        self.descriptors
            .iter()
            .find(|d| d.seed == seed)
            .ok_or_else(|| FlashloanError::invalid_seed(seed, "not a configured account seed"))?
            .address(&self.payer.pubkey())
    }

    pub async fn provision_all(&self) -> FlashloanResult<Vec<ProvisionedAccount>> {
        provision_all(self.client.as_ref(), &self.descriptors, &self.payer).await
    }

    pub async fn provision_all_concurrent(&self) -> FlashloanResult<Vec<ProvisionedAccount>> {
        provision_all_concurrent(Arc::clone(&self.client), &self.descriptors, Arc::clone(&self.payer)).await
    }

    /// Send the program's `Init` instruction over the descriptor accounts.
    pub async fn dispatch_init(&self) -> FlashloanResult<Signature> {
        self.dispatch(FlashloanInstruction::Init, &[]).await
    }

    pub async fn dispatch(&self, opcode: FlashloanInstruction, payload: &[u8]) -> FlashloanResult<Signature> {
        let accounts = self.account_addresses()?;
        dispatch(self.client.as_ref(), &self.program_id, &self.payer, &accounts, opcode, payload).await
    }

    pub async fn report(&self, address: &Pubkey) -> FlashloanResult<Vec<u8>> {
        read_account(self.client.as_ref(), address).await
    }
}
