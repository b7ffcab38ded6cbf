use std::fmt;

use anyhow::Result;
use flashloan_client::{FlashloanContext, NetworkClient, SEED_FLASHLOAN_PROGRAM};
use serde::Serialize;

use super::establish::EstablishOut;
use super::init::{init, InitOut};
use super::provision::{provision, ProvisionOut};
use super::report::{report, ReportOut};
use crate::output;

#[derive(Debug, Serialize)]
pub struct RunOut {
    pub establish: EstablishOut,
    pub provision: ProvisionOut,
    pub init: InitOut,
    pub report: ReportOut,
}

impl fmt::Display for RunOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.establish)?;
        writeln!(f, "{}", self.provision)?;
        writeln!(f, "{}", self.init)?;
        write!(f, "{}", self.report)
    }
}

/// The whole pipeline. A failing step stops everything after it.
pub async fn run<C: NetworkClient + 'static>(ctx: &FlashloanContext<C>, rpc_url: &str, concurrent: bool) -> Result<()> {
    let establish = EstablishOut::from_context(ctx, rpc_url);
    let provision = provision(ctx, concurrent).await?;
    let init = init(ctx).await?;
    let report = report(ctx, None, SEED_FLASHLOAN_PROGRAM).await?;
    output::print(&RunOut {
        establish,
        provision,
        init,
        report,
    })
}
