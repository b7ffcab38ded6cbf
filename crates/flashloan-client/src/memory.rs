//! In-memory ledger implementing `NetworkClient`.
//!
//! Used by tests and by the CLI `--simulate` mode. It models just enough of
//! the cluster for this client: balances, rent exemption, signature checks,
//! fees, at-most-once seeded account creation and a log of program
//! invocations.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use solana_program::pubkey::Pubkey;
use solana_sdk::account::Account;
use solana_sdk::bpf_loader_upgradeable;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::InstructionError;
use solana_sdk::rent::Rent;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction::{SystemError, SystemInstruction};
use solana_sdk::system_program;
use solana_sdk::transaction::{Transaction, TransactionError};

use crate::instruction::FlashloanInstruction;
use crate::network::{NetworkClient, NetworkFailure, NetworkResult, ProtocolParameters};

/// Fee charged per signature.
pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

/// Account reference as seen by the invoked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationAccount {
    pub address: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// A program instruction the ledger executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program_id: Pubkey,
    pub accounts: Vec<InvocationAccount>,
    pub opcode: Option<FlashloanInstruction>,
    pub data: Vec<u8>,
    pub signature: Signature,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    creations: Vec<Pubkey>,
    invocations: Vec<Invocation>,
    airdrops: Vec<(Pubkey, u64)>,
    failing_queries: HashSet<Pubkey>,
    preempted: HashMap<Pubkey, Account>,
    rejected_creations: HashMap<Pubkey, InstructionError>,
    phantom_in_use: HashSet<Pubkey>,
    program_error: Option<u32>,
    failing_submissions: bool,
}

pub struct MemoryLedger {
    rent: Rent,
    blockhash: Hash,
    state: Mutex<LedgerState>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            rent: Rent::default(),
            blockhash: Hash::new_unique(),
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// A ledger with an executable program deployed at `program_id`.
    pub fn with_program(program_id: Pubkey) -> Self {
        let ledger = Self::new();
        ledger.deploy_program(program_id);
        ledger
    }

    pub fn deploy_program(&self, program_id: Pubkey) {
        let account = Account {
            lamports: self.rent.minimum_balance(0),
            data: Vec::new(),
            owner: bpf_loader_upgradeable::id(),
            executable: true,
            rent_epoch: 0,
        };
        self.state.lock().accounts.insert(program_id, account);
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.state.lock().accounts.insert(address, account);
    }

    pub fn credit(&self, address: &Pubkey, lamports: u64) {
        let mut state = self.state.lock();
        let account = state
            .accounts
            .entry(*address)
            .or_insert_with(|| Account::new(0, 0, &system_program::id()));
        account.lamports = account.lamports.saturating_add(lamports);
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.state.lock().accounts.get(address).cloned()
    }

    pub fn lamports(&self, address: &Pubkey) -> u64 {
        self.account(address).map(|a| a.lamports).unwrap_or(0)
    }

    /// Addresses created through `create_account_with_seed`, in order.
    pub fn creations(&self) -> Vec<Pubkey> {
        self.state.lock().creations.clone()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().invocations.clone()
    }

    pub fn airdrops(&self) -> Vec<(Pubkey, u64)> {
        self.state.lock().airdrops.clone()
    }

    /// Make every account query for `address` fail with a transport error.
    pub fn fail_queries_for(&self, address: Pubkey) {
        self.state.lock().failing_queries.insert(address);
    }

    /// Let another party create `address` right after the next query for it
    /// reports it missing.
    pub fn preempt_creation(&self, address: Pubkey, account: Account) {
        self.state.lock().preempted.insert(address, account);
    }

    /// Make the system program refuse to create `address` with `err`.
    pub fn reject_creations(&self, address: Pubkey, err: InstructionError) {
        self.state.lock().rejected_creations.insert(address, err);
    }

    /// Report `address` as already in use on creation while no account is
    /// visible at it.
    pub fn report_in_use(&self, address: Pubkey) {
        self.state.lock().phantom_in_use.insert(address);
    }

    /// Make every transaction submission fail with a transport error.
    pub fn fail_submissions(&self) {
        self.state.lock().failing_submissions = true;
    }

    /// Make program invocations fail with `Custom(code)`.
    pub fn reject_program_calls(&self, code: u32) {
        self.state.lock().program_error = Some(code);
    }

    fn execute(&self, tx: &Transaction) -> Result<Signature, TransactionError> {
        tx.verify()?;
        let message = &tx.message;
        let keys = &message.account_keys;
        let fee_payer = *keys.first().ok_or(TransactionError::AccountNotFound)?;
        let fee = LAMPORTS_PER_SIGNATURE * u64::from(message.header.num_required_signatures);
        let signature = tx.signatures.first().copied().unwrap_or_default();

        let mut state = self.state.lock();
        let payer_lamports = state.accounts.get(&fee_payer).map(|a| a.lamports).unwrap_or(0);
        if payer_lamports == 0 {
            return Err(TransactionError::AccountNotFound);
        }
        if payer_lamports < fee {
            return Err(TransactionError::InsufficientFundsForFee);
        }

        if let Some(payer) = state.accounts.get_mut(&fee_payer) {
            payer.lamports -= fee;
        }

        // Instructions run against a scratch copy so a failure leaves no trace
        // except the fee.
        let mut scratch = state.accounts.clone();
        let mut created = Vec::new();
        let mut invoked = Vec::new();
        for (index, ix) in message.instructions.iter().enumerate() {
            let index = index as u8;
            let program_id = key_at(keys, ix.program_id_index)?;
            let ix_keys = ix
                .accounts
                .iter()
                .map(|i| key_at(keys, *i))
                .collect::<Result<Vec<Pubkey>, _>>()?;
            if program_id == system_program::id() {
                if let Some(to) = ix_keys.get(1) {
                    if let Some(err) = state.rejected_creations.get(to) {
                        return Err(TransactionError::InstructionError(index, err.clone()));
                    }
                    if state.phantom_in_use.contains(to) {
                        return Err(TransactionError::InstructionError(
                            index,
                            InstructionError::Custom(SystemError::AccountAlreadyInUse as u32),
                        ));
                    }
                }
                let created_address = run_system(&self.rent, &mut scratch, &ix_keys, &ix.data)
                    .map_err(|e| TransactionError::InstructionError(index, e))?;
                created.push(created_address);
                continue;
            }
            match scratch.get(&program_id) {
                Some(program) if program.executable => {}
                _ => return Err(TransactionError::ProgramAccountNotFound),
            }
            if let Some(code) = state.program_error {
                return Err(TransactionError::InstructionError(index, InstructionError::Custom(code)));
            }
            let accounts = ix
                .accounts
                .iter()
                .zip(&ix_keys)
                .map(|(i, address)| InvocationAccount {
                    address: *address,
                    is_signer: message.is_signer(*i as usize),
                    is_writable: is_writable(message, *i as usize),
                })
                .collect();
            invoked.push(Invocation {
                program_id,
                accounts,
                opcode: FlashloanInstruction::from_tag(&ix.data).map(|(op, _)| op),
                data: ix.data.clone(),
                signature,
            });
        }

        state.accounts = scratch;
        state.creations.extend(created);
        state.invocations.extend(invoked);
        Ok(signature)
    }
}

fn key_at(keys: &[Pubkey], index: u8) -> Result<Pubkey, TransactionError> {
    keys.get(index as usize).copied().ok_or(TransactionError::SanitizeFailure)
}

fn is_writable(message: &solana_sdk::message::Message, index: usize) -> bool {
    let header = &message.header;
    let signed = header.num_required_signatures as usize;
    if index < signed {
        index < signed - header.num_readonly_signed_accounts as usize
    } else {
        index < message.account_keys.len() - header.num_readonly_unsigned_accounts as usize
    }
}

/// Supports `CreateAccountWithSeed`, the only system instruction this client
/// sends. Returns the created address.
fn run_system(
    rent: &Rent,
    accounts: &mut HashMap<Pubkey, Account>,
    keys: &[Pubkey],
    data: &[u8],
) -> Result<Pubkey, InstructionError> {
    let instruction: SystemInstruction = bincode::deserialize(data).map_err(|_| InstructionError::InvalidInstructionData)?;
    let SystemInstruction::CreateAccountWithSeed {
        base,
        seed,
        lamports,
        space,
        owner,
    } = instruction
    else {
        return Err(InstructionError::InvalidInstructionData);
    };
    let (from, to) = match keys {
        [from, to, ..] => (*from, *to),
        _ => return Err(InstructionError::NotEnoughAccountKeys),
    };
    let expected = Pubkey::create_with_seed(&base, &seed, &owner).map_err(|_| InstructionError::InvalidSeeds)?;
    if expected != to {
        return Err(InstructionError::Custom(SystemError::AddressWithSeedMismatch as u32));
    }
    if accounts.get(&to).is_some_and(|a| a.lamports > 0 || !a.data.is_empty()) {
        return Err(InstructionError::Custom(SystemError::AccountAlreadyInUse as u32));
    }
    if lamports < rent.minimum_balance(space as usize) {
        return Err(InstructionError::InsufficientFunds);
    }
    let funder = accounts.get_mut(&from).ok_or(InstructionError::MissingAccount)?;
    if funder.lamports < lamports {
        return Err(InstructionError::Custom(SystemError::ResultWithNegativeLamports as u32));
    }
    funder.lamports -= lamports;
    accounts.insert(to, Account::new(lamports, space as usize, &owner));
    Ok(to)
}

impl NetworkClient for MemoryLedger {
    async fn version(&self) -> NetworkResult<String> {
        Ok(format!("memory-ledger {}", env!("CARGO_PKG_VERSION")))
    }

    async fn protocol_parameters(&self) -> NetworkResult<ProtocolParameters> {
        Ok(ProtocolParameters {
            blockhash: self.blockhash,
            lamports_per_signature: LAMPORTS_PER_SIGNATURE,
        })
    }

    async fn minimum_balance_for_rent_exemption(&self, size: usize) -> NetworkResult<u64> {
        Ok(self.rent.minimum_balance(size))
    }

    async fn balance(&self, address: &Pubkey) -> NetworkResult<u64> {
        Ok(self.lamports(address))
    }

    async fn account_info(&self, address: &Pubkey) -> NetworkResult<Option<Account>> {
        let mut state = self.state.lock();
        if state.failing_queries.contains(address) {
            return Err(NetworkFailure::Transport(format!("connection reset while reading {address}")));
        }
        let current = state.accounts.get(address).cloned();
        if current.is_none() {
            if let Some(account) = state.preempted.remove(address) {
                state.accounts.insert(*address, account);
            }
        }
        Ok(current)
    }

    async fn request_funds(&self, address: &Pubkey, lamports: u64) -> NetworkResult<Signature> {
        self.credit(address, lamports);
        self.state.lock().airdrops.push((*address, lamports));
        Ok(Signature::new_unique())
    }

    async fn submit_and_confirm(&self, transaction: &Transaction) -> NetworkResult<Signature> {
        if self.state.lock().failing_submissions {
            return Err(NetworkFailure::Transport("connection reset while submitting".to_string()));
        }
        self.execute(transaction).map_err(NetworkFailure::Transaction)
    }
}
