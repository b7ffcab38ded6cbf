//! Idempotent provisioning of the seeded accounts.
//!
//! Each account is checked first and created only when absent. An address that
//! turns out to be taken during creation is re-read, never re-created.

use std::sync::Arc;

use solana_program::pubkey::Pubkey;
use solana_sdk::instruction::InstructionError;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction::{self, SystemError};
use solana_sdk::transaction::{Transaction, TransactionError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::descriptor::{AccountDescriptor, ProvisionStatus, ProvisionedAccount};
use crate::errors::{FlashloanError, FlashloanResult};
use crate::network::{NetworkClient, NetworkFailure};

/// Make sure the account for `descriptor` exists under `payer`.
///
/// Existing accounts are returned untouched. Missing ones are created with
/// rent-exempt funding from `payer`, owned by the descriptor's program.
pub async fn ensure_account<C: NetworkClient>(
    client: &C,
    descriptor: &AccountDescriptor,
    payer: &Keypair,
) -> FlashloanResult<ProvisionedAccount> {
    let base = payer.pubkey();
    let address = descriptor.address(&base)?;
    debug!(seed = %descriptor.seed, %address, "derived account address");

    if let Some(account) = fetch(client, &address).await? {
        info!(seed = %descriptor.seed, %address, lamports = account.lamports, "account already exists");
        return Ok(ProvisionedAccount::from_account(&descriptor.seed, address, account, ProvisionStatus::Existing));
    }

    let lamports = client
        .minimum_balance_for_rent_exemption(descriptor.size_bytes)
        .await
        .map_err(|e| FlashloanError::network(address, e))?;
    let params = client
        .protocol_parameters()
        .await
        .map_err(|e| FlashloanError::network(address, e))?;
    let available = client.balance(&base).await.map_err(|e| FlashloanError::network(base, e))?;
    let required = lamports.saturating_add(params.lamports_per_signature);
    if available < required {
        return Err(FlashloanError::insufficient_funds(
            base,
            address,
            format!("need {required} lamports (rent {lamports} + fee {}), have {available}", params.lamports_per_signature),
        ));
    }

    info!(seed = %descriptor.seed, %address, lamports, space = descriptor.size_bytes, "creating account");
    let ix = system_instruction::create_account_with_seed(
        &base,
        &address,
        &base,
        &descriptor.seed,
        lamports,
        descriptor.size_bytes as u64,
        &descriptor.owning_program,
    );
    let tx = Transaction::new_signed_with_payer(&[ix], Some(&base), &[payer], params.blockhash);

    let status = match client.submit_and_confirm(&tx).await {
        Ok(signature) => {
            info!(seed = %descriptor.seed, %address, %signature, "account created");
            ProvisionStatus::Created
        }
        Err(NetworkFailure::Transaction(err)) if is_already_in_use(&err) => {
            warn!(seed = %descriptor.seed, %address, "address taken concurrently; re-reading");
            ProvisionStatus::Existing
        }
        Err(NetworkFailure::Transaction(err)) if is_insufficient_funds(&err) => {
            return Err(FlashloanError::insufficient_funds(base, address, err.to_string()));
        }
        Err(NetworkFailure::Transaction(err)) => {
            return Err(FlashloanError::CreationRejected {
                address,
                reason: err.to_string(),
            });
        }
        Err(err) => return Err(FlashloanError::network(address, err)),
    };

    match fetch(client, &address).await? {
        Some(account) => Ok(ProvisionedAccount::from_account(&descriptor.seed, address, account, status)),
        None => Err(FlashloanError::CreationRejected {
            address,
            reason: match status {
                ProvisionStatus::Created => "creation confirmed but account is not visible".to_string(),
                ProvisionStatus::Existing => "address reported in use but no account is visible".to_string(),
            },
        }),
    }
}

/// Provision every descriptor in order, stopping at the first failure.
pub async fn provision_all<C: NetworkClient>(
    client: &C,
    descriptors: &[AccountDescriptor],
    payer: &Keypair,
) -> FlashloanResult<Vec<ProvisionedAccount>> {
    let mut out = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        out.push(ensure_account(client, descriptor, payer).await?);
    }
    Ok(out)
}

/// Provision every descriptor concurrently.
///
/// Results keep descriptor order. The first failure aborts the tasks still
/// running; accounts already created stay on chain.
pub async fn provision_all_concurrent<C: NetworkClient + 'static>(
    client: Arc<C>,
    descriptors: &[AccountDescriptor],
    payer: Arc<Keypair>,
) -> FlashloanResult<Vec<ProvisionedAccount>> {
    let mut set = JoinSet::new();
    for (index, descriptor) in descriptors.iter().cloned().enumerate() {
        let client = Arc::clone(&client);
        let payer = Arc::clone(&payer);
        set.spawn(async move { (index, ensure_account(client.as_ref(), &descriptor, &payer).await) });
    }

    let mut slots: Vec<Option<ProvisionedAccount>> = vec![None; descriptors.len()];
    while let Some(joined) = set.join_next().await {
        let (index, result) = match joined {
            Ok(v) => v,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => return Err(FlashloanError::Interrupted(err.to_string())),
        };
        match result {
            Ok(account) => slots[index] = Some(account),
            Err(err) => {
                set.abort_all();
                return Err(err);
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

async fn fetch<C: NetworkClient>(client: &C, address: &Pubkey) -> FlashloanResult<Option<solana_sdk::account::Account>> {
    client
        .account_info(address)
        .await
        .map_err(|e| FlashloanError::network(*address, e))
}

fn is_already_in_use(err: &TransactionError) -> bool {
    matches!(
        err,
        TransactionError::InstructionError(_, InstructionError::Custom(code))
            if *code == SystemError::AccountAlreadyInUse as u32
    )
}

fn is_insufficient_funds(err: &TransactionError) -> bool {
    match err {
        TransactionError::InsufficientFundsForFee
        | TransactionError::InsufficientFundsForRent { .. }
        | TransactionError::AccountNotFound => true,
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            *code == SystemError::ResultWithNegativeLamports as u32
        }
        TransactionError::InstructionError(_, InstructionError::InsufficientFunds) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use solana_sdk::account::Account;

    use crate::descriptor::default_descriptors;
    use crate::memory::MemoryLedger;

    const SOL: u64 = 1_000_000_000;

    fn setup() -> (MemoryLedger, Keypair, Pubkey) {
        let program_id = Pubkey::new_unique();
        let ledger = MemoryLedger::with_program(program_id);
        let payer = Keypair::new();
        ledger.credit(&payer.pubkey(), SOL);
        (ledger, payer, program_id)
    }

    #[tokio::test]
    async fn creates_missing_account_with_rent_exempt_funding() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello1", 100, program_id);
        let account = ensure_account(&ledger, &descriptor, &payer).await.unwrap();

        assert_eq!(account.status, ProvisionStatus::Created);
        assert_eq!(account.owner, program_id);
        assert_eq!(account.data.len(), 100);
        assert_eq!(account.lamports, ledger.minimum_balance_for_rent_exemption(100).await.unwrap());
        assert_eq!(account.address, descriptor.address(&payer.pubkey()).unwrap());
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello2", 100, program_id);
        let first = ensure_account(&ledger, &descriptor, &payer).await.unwrap();
        let payer_after_first = ledger.lamports(&payer.pubkey());
        let second = ensure_account(&ledger, &descriptor, &payer).await.unwrap();

        assert_eq!(ledger.creations().len(), 1);
        assert_eq!(first.address, second.address);
        assert!(second.lamports >= first.lamports);
        assert_eq!(second.status, ProvisionStatus::Existing);
        assert_eq!(ledger.lamports(&payer.pubkey()), payer_after_first);
    }

    #[tokio::test]
    async fn existing_account_is_not_refunded_or_reshaped() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello3", 100, program_id);
        let address = descriptor.address(&payer.pubkey()).unwrap();
        ledger.set_account(address, Account::new(1, 8, &program_id));

        let account = ensure_account(&ledger, &descriptor, &payer).await.unwrap();
        assert_eq!(account.lamports, 1);
        assert_eq!(account.data.len(), 8);
        assert!(ledger.creations().is_empty());
        assert_eq!(ledger.lamports(&payer.pubkey()), SOL);
    }

    #[tokio::test]
    async fn concurrent_creator_counts_as_success() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello4", 100, program_id);
        let address = descriptor.address(&payer.pubkey()).unwrap();
        ledger.preempt_creation(address, Account::new(2_000_000, 100, &program_id));

        let account = ensure_account(&ledger, &descriptor, &payer).await.unwrap();
        assert_eq!(account.status, ProvisionStatus::Existing);
        assert_eq!(account.lamports, 2_000_000);
        assert!(ledger.creations().is_empty());
    }

    #[tokio::test]
    async fn underfunded_payer_creates_nothing() {
        let program_id = Pubkey::new_unique();
        let ledger = MemoryLedger::with_program(program_id);
        let payer = Keypair::new();
        ledger.credit(&payer.pubkey(), 10_000);
        let descriptor = AccountDescriptor::new("hello1", 100, program_id);

        let err = ensure_account(&ledger, &descriptor, &payer).await.unwrap_err();
        assert_matches!(err, FlashloanError::InsufficientFunds { .. });
        assert!(ledger.account(&descriptor.address(&payer.pubkey()).unwrap()).is_none());
        assert_eq!(ledger.lamports(&payer.pubkey()), 10_000);
    }

    #[tokio::test]
    async fn transport_failure_propagates_with_address() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello1", 100, program_id);
        let address = descriptor.address(&payer.pubkey()).unwrap();
        ledger.fail_queries_for(address);

        let err = ensure_account(&ledger, &descriptor, &payer).await.unwrap_err();
        assert_matches!(err, FlashloanError::Network { address: a, source: NetworkFailure::Transport(_) } if a == address);
    }

    #[tokio::test]
    async fn sequential_provisioning_stops_at_first_failure() {
        let (ledger, payer, program_id) = setup();
        let descriptors = default_descriptors(&program_id);
        let third = descriptors[2].address(&payer.pubkey()).unwrap();
        ledger.fail_queries_for(third);

        let err = provision_all(&ledger, &descriptors, &payer).await.unwrap_err();
        assert_eq!(err.address(), Some(third));
        let created = ledger.creations();
        assert_eq!(created.len(), 2);
        assert!(ledger.account(&descriptors[3].address(&payer.pubkey()).unwrap()).is_none());
    }

    #[tokio::test]
    async fn concurrent_provisioning_keeps_descriptor_order() {
        let (ledger, payer, program_id) = setup();
        let descriptors = default_descriptors(&program_id);
        let ledger = Arc::new(ledger);
        let payer = Arc::new(payer);

        let accounts = provision_all_concurrent(Arc::clone(&ledger), &descriptors, Arc::clone(&payer))
            .await
            .unwrap();
        let seeds: Vec<&str> = accounts.iter().map(|a| a.seed.as_str()).collect();
        assert_eq!(seeds, ["hello1", "hello2", "hello3", "hello4"]);
        assert_eq!(ledger.creations().len(), 4);
    }

    #[tokio::test]
    async fn refused_creation_is_rejected() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello2", 100, program_id);
        let address = descriptor.address(&payer.pubkey()).unwrap();
        ledger.reject_creations(address, InstructionError::InvalidAccountOwner);

        let err = ensure_account(&ledger, &descriptor, &payer).await.unwrap_err();
        assert_matches!(err, FlashloanError::CreationRejected { address: a, .. } if a == address);
        assert!(ledger.account(&address).is_none());
        assert!(ledger.creations().is_empty());
    }

    #[tokio::test]
    async fn in_use_but_invisible_is_rejected() {
        let (ledger, payer, program_id) = setup();
        let descriptor = AccountDescriptor::new("hello3", 100, program_id);
        let address = descriptor.address(&payer.pubkey()).unwrap();
        ledger.report_in_use(address);

        let err = ensure_account(&ledger, &descriptor, &payer).await.unwrap_err();
        assert_matches!(
            err,
            FlashloanError::CreationRejected { address: a, ref reason } if a == address && reason.contains("no account is visible")
        );
        assert!(ledger.account(&address).is_none());
        assert!(ledger.creations().is_empty());
    }

    #[tokio::test]
    async fn concurrent_provisioning_fails_fast() {
        let (ledger, payer, program_id) = setup();
        let descriptors = default_descriptors(&program_id);
        let second = descriptors[1].address(&payer.pubkey()).unwrap();
        ledger.fail_queries_for(second);
        let ledger = Arc::new(ledger);

        let err = provision_all_concurrent(Arc::clone(&ledger), &descriptors, Arc::new(payer))
            .await
            .unwrap_err();
        assert_matches!(err, FlashloanError::Network { address, source: NetworkFailure::Transport(_) } if address == second);
        assert!(!ledger.creations().contains(&second));
        assert!(ledger.account(&second).is_none());
    }

    #[test]
    fn error_classification() {
        let in_use = TransactionError::InstructionError(0, InstructionError::Custom(SystemError::AccountAlreadyInUse as u32));
        assert!(is_already_in_use(&in_use));
        assert!(!is_insufficient_funds(&in_use));
        assert!(is_insufficient_funds(&TransactionError::InsufficientFundsForFee));
        assert!(!is_already_in_use(&TransactionError::BlockhashNotFound));
    }
}
