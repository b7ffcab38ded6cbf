use anyhow::{Context, Result};
use flashloan_client::memory::MemoryLedger;
use flashloan_client::{FlashloanContext, Identity, NetworkClient, RpcNetworkClient};

use crate::args::{Cli, Command, SessionCommand};
use crate::session;

mod derive;
mod establish;
mod init;
mod provision;
mod report;
mod run;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let identity = session::identity(&cli)?;
    let simulate = cli.simulate;
    match cli.command {
        Command::Derive { seeds } => derive::run(&identity, &seeds),
        Command::Session(command) if simulate => {
            let ledger = MemoryLedger::with_program(identity.program_id);
            run_session(command, ledger, identity).await
        }
        Command::Session(command) => {
            let client = RpcNetworkClient::new(&identity.rpc_url, identity.commitment);
            run_session(command, client, identity).await
        }
    }
}

async fn run_session<C: NetworkClient + 'static>(command: SessionCommand, client: C, identity: Identity) -> Result<()> {
    let rpc_url = identity.rpc_url.clone();
    let ctx = FlashloanContext::establish(client, identity)
        .await
        .context("establish: connecting and funding payer")?;

    match command {
        SessionCommand::Establish => establish::run(&ctx, &rpc_url),
        SessionCommand::Provision { concurrent } => provision::run(&ctx, concurrent).await,
        SessionCommand::Init => init::run(&ctx).await,
        SessionCommand::Report { address, seed } => report::run(&ctx, address, &seed).await,
        SessionCommand::Run { concurrent } => run::run(&ctx, &rpc_url, concurrent).await,
    }
}
