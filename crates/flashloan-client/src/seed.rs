//! Seeded address derivation for the flashloan program accounts.
//!
//! Addresses are `sha256(base || seed || owner)`, the scheme the system
//! program verifies for `create_account_with_seed`. Derivation is pure: no
//! network access and no stored private key for the derived account.

use solana_program::pubkey::{Pubkey, MAX_SEED_LEN};

use crate::errors::{FlashloanError, FlashloanResult};

/// Derive the address owned by `owner` for `seed` under `base`.
pub fn derive_address(base: &Pubkey, seed: &str, owner: &Pubkey) -> FlashloanResult<Pubkey> {
    if seed.len() > MAX_SEED_LEN {
        return Err(FlashloanError::invalid_seed(
            seed,
            format!("{} bytes exceeds the {MAX_SEED_LEN} byte limit", seed.len()),
        ));
    }
    Pubkey::create_with_seed(base, seed, owner).map_err(|e| FlashloanError::invalid_seed(seed, e.to_string()))
}
