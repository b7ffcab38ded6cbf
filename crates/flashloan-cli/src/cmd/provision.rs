use std::fmt;

use anyhow::{Context, Result};
use flashloan_client::{FlashloanContext, NetworkClient, ProvisionStatus, ProvisionedAccount};
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct AccountOut {
    pub seed: String,
    pub address: String,
    pub status: ProvisionStatus,
    pub lamports: u64,
    pub owner: String,
    pub size: usize,
}

impl From<&ProvisionedAccount> for AccountOut {
    fn from(a: &ProvisionedAccount) -> Self {
        Self {
            seed: a.seed.clone(),
            address: a.address.to_string(),
            status: a.status,
            lamports: a.lamports,
            owner: a.owner.to_string(),
            size: a.data.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProvisionOut {
    pub accounts: Vec<AccountOut>,
}

impl fmt::Display for ProvisionOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let created = self.accounts.iter().filter(|a| a.status == ProvisionStatus::Created).count();
        write!(f, "{} account(s) ready, {created} created", self.accounts.len())
    }
}

pub async fn provision<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>, concurrent: bool) -> Result<ProvisionOut> {
    let accounts = if concurrent {
        ctx.provision_all_concurrent().await
    } else {
        ctx.provision_all().await
    }
    .context("provision: creating seeded accounts")?;

    if !output::is_json() {
        for a in &accounts {
            let (tag, fresh) = match a.status {
                ProvisionStatus::Created => ("created", true),
                ProvisionStatus::Existing => ("exists", false),
            };
            output::status_line(tag, fresh, &format!("{} {} ({} lamports)", a.seed, a.address, a.lamports))?;
        }
    }
    Ok(ProvisionOut {
        accounts: accounts.iter().map(AccountOut::from).collect(),
    })
}

pub async fn run<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>, concurrent: bool) -> Result<()> {
    output::print(&provision(ctx, concurrent).await?)
}
