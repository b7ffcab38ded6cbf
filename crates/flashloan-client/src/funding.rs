//! Payer funding and program deployment checks, run once while establishing
//! a session.

use std::path::Path;

use solana_program::pubkey::Pubkey;
use tracing::info;

use crate::constants::FEE_SIGNATURE_BUDGET;
use crate::descriptor::AccountDescriptor;
use crate::errors::{FlashloanError, FlashloanResult};
use crate::network::NetworkClient;

/// Lamports the payer needs to create the descriptors not yet on chain and
/// pay fees.
pub async fn required_funding<C: NetworkClient>(
    client: &C,
    payer: &Pubkey,
    descriptors: &[AccountDescriptor],
) -> FlashloanResult<u64> {
    let mut total = 0u64;
    for descriptor in descriptors {
        let address = descriptor.address(payer)?;
        let existing = client
            .account_info(&address)
            .await
            .map_err(|e| FlashloanError::network(address, e))?;
        if existing.is_some() {
            continue;
        }
        let rent = client
            .minimum_balance_for_rent_exemption(descriptor.size_bytes)
            .await
            .map_err(|e| FlashloanError::network(*payer, e))?;
        total = total.saturating_add(rent);
    }
    let params = client
        .protocol_parameters()
        .await
        .map_err(|e| FlashloanError::network(*payer, e))?;
    Ok(total.saturating_add(params.lamports_per_signature.saturating_mul(FEE_SIGNATURE_BUDGET)))
}

/// Top the payer up to `required` lamports with an airdrop when short.
/// Returns the resulting balance.
pub async fn fund_payer<C: NetworkClient>(client: &C, payer: &Pubkey, required: u64) -> FlashloanResult<u64> {
    let balance = client.balance(payer).await.map_err(|e| FlashloanError::network(*payer, e))?;
    if balance >= required {
        return Ok(balance);
    }
    let shortfall = required - balance;
    info!(%payer, balance, shortfall, "requesting airdrop");
    client
        .request_funds(payer, shortfall)
        .await
        .map_err(|e| FlashloanError::network(*payer, e))?;
    client.balance(payer).await.map_err(|e| FlashloanError::network(*payer, e))
}

/// Verify the program is deployed and executable.
///
/// `so_path` is the build artifact, used only to word the error.
pub async fn check_program<C: NetworkClient>(
    client: &C,
    program_id: &Pubkey,
    so_path: Option<&Path>,
) -> FlashloanResult<()> {
    let info = client
        .account_info(program_id)
        .await
        .map_err(|e| FlashloanError::network(*program_id, e))?;
    match info {
        None => {
            let hint = if so_path.is_some_and(|p| p.exists()) {
                "needs to be deployed"
            } else {
                "needs to be built and deployed"
            };
            Err(FlashloanError::ProgramNotDeployed {
                program_id: *program_id,
                hint: hint.to_string(),
            })
        }
        Some(account) if !account.executable => Err(FlashloanError::ProgramNotExecutable { program_id: *program_id }),
        Some(_) => {
            info!(%program_id, "using program");
            Ok(())
        }
    }
}
