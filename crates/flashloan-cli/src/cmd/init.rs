use std::fmt;

use anyhow::{Context, Result};
use flashloan_client::{FlashloanContext, NetworkClient};
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct InitOut {
    pub signature: String,
    pub program_id: String,
    pub accounts: Vec<String>,
}

impl fmt::Display for InitOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Init confirmed: {} ({} account(s) after payer)",
            self.signature,
            self.accounts.len()
        )
    }
}

pub async fn init<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>) -> Result<InitOut> {
    let signature = ctx.dispatch_init().await.context("init: dispatching Init instruction")?;
    Ok(InitOut {
        signature: signature.to_string(),
        program_id: ctx.program_id().to_string(),
        accounts: ctx.account_addresses()?.iter().map(|a| a.to_string()).collect(),
    })
}

pub async fn run<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>) -> Result<()> {
    output::print(&init(ctx).await?)
}
