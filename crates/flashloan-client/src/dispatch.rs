//! Instruction dispatch to the flashloan program.
//!
//! Account order is part of the program's wire contract:
//! 0. `[signer, writable]` payer
//! 1.. `[writable]` seeded accounts in descriptor declaration order

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};
use tracing::info;

use crate::errors::{FlashloanError, FlashloanResult};
use crate::instruction::{FlashloanInstruction, InstructionCall};
use crate::network::{NetworkClient, NetworkFailure};

/// Build the program instruction with the fixed account order.
pub fn build_instruction(
    program_id: &Pubkey,
    payer: &Pubkey,
    accounts: &[Pubkey],
    opcode: FlashloanInstruction,
    payload: &[u8],
) -> FlashloanResult<Instruction> {
    let mut metas = Vec::with_capacity(accounts.len() + 1);
    metas.push(AccountMeta::new(*payer, true));
    metas.extend(accounts.iter().map(|a| AccountMeta::new(*a, false)));

    InstructionCall {
        program_id: *program_id,
        accounts: metas,
        opcode,
        payload: payload.to_vec(),
    }
    .into_instruction()
}

/// Sign and submit a single-instruction transaction, waiting for confirmation.
pub async fn dispatch<C: NetworkClient>(
    client: &C,
    program_id: &Pubkey,
    payer: &Keypair,
    accounts: &[Pubkey],
    opcode: FlashloanInstruction,
    payload: &[u8],
) -> FlashloanResult<Signature> {
    let payer_key = payer.pubkey();
    let ix = build_instruction(program_id, &payer_key, accounts, opcode, payload)?;
    let params = client
        .protocol_parameters()
        .await
        .map_err(|e| FlashloanError::network(*program_id, e))?;
    let tx = Transaction::new_signed_with_payer(&[ix], Some(&payer_key), &[payer], params.blockhash);

    match client.submit_and_confirm(&tx).await {
        Ok(signature) => {
            info!(%program_id, ?opcode, %signature, accounts = accounts.len(), "instruction confirmed");
            Ok(signature)
        }
        Err(NetworkFailure::Transaction(
            err @ (TransactionError::InsufficientFundsForFee | TransactionError::AccountNotFound),
        )) => Err(FlashloanError::insufficient_funds(payer_key, *program_id, err.to_string())),
        Err(NetworkFailure::Transaction(err)) => Err(FlashloanError::Rejected {
            program_id: *program_id,
            reason: err.to_string(),
        }),
        Err(err) => Err(FlashloanError::network(*program_id, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;

    use crate::memory::MemoryLedger;

    #[test]
    fn payer_leads_regardless_of_account_order() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let accounts = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        let mut reversed = accounts;
        reversed.reverse();

        for order in [&accounts, &reversed] {
            let ix = build_instruction(&program_id, &payer, order, FlashloanInstruction::Init, &[]).unwrap();
            assert_eq!(ix.accounts[0], AccountMeta::new(payer, true));
            let rest: Vec<Pubkey> = ix.accounts[1..].iter().map(|m| m.pubkey).collect();
            assert_eq!(rest, order.to_vec());
            assert!(ix.accounts[1..].iter().all(|m| m.is_writable && !m.is_signer));
            assert_eq!(ix.data, b"0");
        }
    }

    #[tokio::test]
    async fn program_failure_is_rejected() {
        let program_id = Pubkey::new_unique();
        let ledger = MemoryLedger::with_program(program_id);
        let payer = Keypair::new();
        ledger.credit(&payer.pubkey(), 1_000_000);
        ledger.reject_program_calls(6);

        let err = dispatch(&ledger, &program_id, &payer, &[Pubkey::new_unique()], FlashloanInstruction::Init, &[])
            .await
            .unwrap_err();
        assert_matches!(err, FlashloanError::Rejected { program_id: p, .. } if p == program_id);
        assert!(ledger.invocations().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let program_id = Pubkey::new_unique();
        let ledger = MemoryLedger::with_program(program_id);
        let payer = Keypair::new();
        ledger.credit(&payer.pubkey(), 1_000_000);
        ledger.fail_submissions();

        let err = dispatch(&ledger, &program_id, &payer, &[Pubkey::new_unique()], FlashloanInstruction::Init, &[])
            .await
            .unwrap_err();
        assert_matches!(
            err,
            FlashloanError::Network { address, source: NetworkFailure::Transport(_) } if address == program_id
        );
        assert!(ledger.invocations().is_empty());
    }

    #[tokio::test]
    async fn unfunded_payer_is_reported() {
        let program_id = Pubkey::new_unique();
        let ledger = MemoryLedger::with_program(program_id);
        let payer = Keypair::new();

        let err = dispatch(&ledger, &program_id, &payer, &[], FlashloanInstruction::Init, &[])
            .await
            .unwrap_err();
        assert_matches!(err, FlashloanError::InsufficientFunds { .. });
    }
}
