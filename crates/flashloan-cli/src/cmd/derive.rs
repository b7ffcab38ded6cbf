use std::fmt;

use anyhow::Result;
use flashloan_client::{derive_address, Identity, ACCOUNT_SEEDS};
use serde::Serialize;
use solana_sdk::signature::Signer;

use crate::output;

#[derive(Debug, Serialize)]
pub struct DerivedOut {
    pub seed: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct DeriveOut {
    pub base: String,
    pub program_id: String,
    pub accounts: Vec<DerivedOut>,
}

impl fmt::Display for DeriveOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "base {} program {}", self.base, self.program_id)?;
        let lines: Vec<String> = self.accounts.iter().map(|a| format!("{:<8} {}", a.seed, a.address)).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

pub fn run(identity: &Identity, seeds: &[String]) -> Result<()> {
    let base = identity.payer.pubkey();
    let seeds: Vec<String> = if seeds.is_empty() {
        ACCOUNT_SEEDS.iter().map(|s| s.to_string()).collect()
    } else {
        seeds.to_vec()
    };

    let accounts = seeds
        .into_iter()
        .map(|seed| {
            let address = derive_address(&base, &seed, &identity.program_id)?;
            Ok(DerivedOut {
                seed,
                address: address.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    output::print(&DeriveOut {
        base: base.to_string(),
        program_id: identity.program_id.to_string(),
        accounts,
    })
}
