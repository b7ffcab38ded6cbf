//! Raw account reads for diagnostics.
//!
//! The byte layout of the program's accounts is not decoded here.

use solana_program::pubkey::Pubkey;
use tracing::debug;

use crate::errors::{FlashloanError, FlashloanResult};
use crate::network::NetworkClient;

/// Fetch the raw data stored at `address`.
pub async fn read_account<C: NetworkClient>(client: &C, address: &Pubkey) -> FlashloanResult<Vec<u8>> {
    let account = client
        .account_info(address)
        .await
        .map_err(|e| FlashloanError::network(*address, e))?
        .ok_or(FlashloanError::AccountNotFound { address: *address })?;
    debug!(%address, owner = %account.owner, bytes = account.data.len(), "account read");
    Ok(account.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use solana_sdk::account::Account;

    use crate::memory::MemoryLedger;

    #[tokio::test]
    async fn returns_raw_bytes() {
        let ledger = MemoryLedger::new();
        let address = Pubkey::new_unique();
        let mut account = Account::new(10, 4, &Pubkey::new_unique());
        account.data.copy_from_slice(&[1, 2, 3, 4]);
        ledger.set_account(address, account);

        assert_eq!(read_account(&ledger, &address).await.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let ledger = MemoryLedger::new();
        let address = Pubkey::new_unique();
        assert_matches!(
            read_account(&ledger, &address).await,
            Err(FlashloanError::AccountNotFound { address: a }) if a == address
        );
    }
}
