use anyhow::{Context, Result};
use flashloan_client::{Identity, IdentitySource};

use crate::args::Cli;

/// Resolve the identity for this invocation.
///
/// `--simulate` uses a throwaway payer and program unless a program id is
/// given.
pub fn identity(cli: &Cli) -> Result<Identity> {
    if cli.simulate {
        let mut identity = Identity::ephemeral();
        if let Some(id) = cli.program_id {
            identity.program_id = id;
        }
        return Ok(identity);
    }

    IdentitySource {
        config_path: cli.config.clone(),
        rpc_url: cli.url.clone(),
        keypair_path: cli.keypair.clone(),
        program_keypair_path: cli.program_keypair.clone(),
        program_id: cli.program_id,
    }
    .resolve()
    .context("loading identity")
}
