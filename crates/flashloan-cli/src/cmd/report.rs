use std::fmt;

use anyhow::{Context, Result};
use flashloan_client::{FlashloanContext, NetworkClient};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::output;

#[derive(Debug, Serialize)]
pub struct ReportOut {
    pub address: String,
    pub bytes: usize,
    pub data_hex: String,
}

impl fmt::Display for ReportOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} holds {} byte(s): {}", self.address, self.bytes, self.data_hex)
    }
}

pub async fn report<C: NetworkClient + 'static>(
    ctx: &FlashloanContext<C>,
    address: Option<Pubkey>,
    seed: &str,
) -> Result<ReportOut> {
    let address = match address {
        Some(a) => a,
        None => ctx.address_for_seed(seed)?,
    };
    let data = ctx
        .report(&address)
        .await
        .with_context(|| format!("report: reading {address}"))?;
    Ok(ReportOut {
        address: address.to_string(),
        bytes: data.len(),
        data_hex: hex::encode(&data),
    })
}

pub async fn run<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>, address: Option<Pubkey>, seed: &str) -> Result<()> {
    output::print(&report(ctx, address, seed).await?)
}
