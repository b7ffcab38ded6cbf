use std::fmt;

use anyhow::Result;
use flashloan_client::{FlashloanContext, NetworkClient};
use serde::Serialize;
use solana_sdk::native_token::lamports_to_sol;

use crate::output;

#[derive(Debug, Serialize)]
pub struct EstablishOut {
    pub rpc_url: String,
    pub node_version: String,
    pub program_id: String,
    pub payer: String,
    pub payer_lamports: u64,
}

impl EstablishOut {
    pub fn from_context<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>, rpc_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            node_version: ctx.node_version().to_string(),
            program_id: ctx.program_id().to_string(),
            payer: ctx.payer().to_string(),
            payer_lamports: ctx.payer_balance(),
        }
    }
}

impl fmt::Display for EstablishOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connection to cluster established: {} ({})", self.rpc_url, self.node_version)?;
        writeln!(f, "Using program {}", self.program_id)?;
        write!(
            f,
            "Using account {} containing {} SOL to pay for fees",
            self.payer,
            lamports_to_sol(self.payer_lamports)
        )
    }
}

pub fn run<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>, rpc_url: &str) -> Result<()> {
    output::print(&EstablishOut::from_context(ctx, rpc_url))
}
