//! Identity loading: RPC endpoint, fee payer and program address.
//!
//! Values come from the Solana CLI config file, overridden by explicit
//! settings. Every failure here is a configuration error raised before any
//! network call.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};

use crate::constants::{
    CLI_CONFIG_RELATIVE_PATH, DEFAULT_KEYPAIR_RELATIVE_PATH, DEFAULT_RPC_URL, PROGRAM_DIR, PROGRAM_KEYPAIR_NAME,
    PROGRAM_SO_NAME,
};
use crate::errors::{FlashloanError, FlashloanResult};

/// The subset of `~/.config/solana/cli/config.yml` this client reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub json_rpc_url: Option<String>,
    #[serde(default)]
    pub keypair_path: Option<String>,
    #[serde(default)]
    pub commitment: Option<String>,
}

impl CliConfig {
    pub fn default_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(CLI_CONFIG_RELATIVE_PATH))
    }

    pub fn load(path: &Path) -> FlashloanResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| FlashloanError::configuration(format!("read {}: {e}", path.display())))?;
        serde_yaml::from_str(&raw).map_err(|e| FlashloanError::configuration(format!("parse {}: {e}", path.display())))
    }

    /// Load `path`, or the default location when it exists. A missing
    /// default file yields an empty config.
    pub fn load_or_default(path: Option<&Path>) -> FlashloanResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }
}

/// Where to find each piece of identity. `None` falls back to the config file
/// and then to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct IdentitySource {
    pub config_path: Option<PathBuf>,
    pub rpc_url: Option<String>,
    pub keypair_path: Option<PathBuf>,
    pub program_keypair_path: Option<PathBuf>,
    pub program_id: Option<Pubkey>,
}

/// Resolved identity of a session.
#[derive(Debug)]
pub struct Identity {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub payer: Keypair,
    pub program_id: Pubkey,
    /// Build artifact of the program, when known.
    pub program_so_path: Option<PathBuf>,
}

impl Identity {
    /// A throwaway identity for in-memory runs.
    pub fn ephemeral() -> Self {
        Self {
            rpc_url: "memory".to_string(),
            commitment: CommitmentConfig::confirmed(),
            payer: Keypair::new(),
            program_id: Keypair::new().pubkey(),
            program_so_path: None,
        }
    }
}

impl IdentitySource {
    pub fn resolve(&self) -> FlashloanResult<Identity> {
        let config = CliConfig::load_or_default(self.config_path.as_deref())?;

        let rpc_url = self
            .rpc_url
            .clone()
            .or(config.json_rpc_url.clone())
            .map(|u| normalize_rpc_url(&u))
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let commitment = match config.commitment.as_deref() {
            Some(level) => parse_commitment(level)?,
            None => CommitmentConfig::confirmed(),
        };

        let keypair_path = match (&self.keypair_path, &config.keypair_path) {
            (Some(p), _) => p.clone(),
            (None, Some(p)) => expand_home(p),
            (None, None) => home_dir()
                .map(|h| h.join(DEFAULT_KEYPAIR_RELATIVE_PATH))
                .ok_or_else(|| FlashloanError::configuration("no keypair path and HOME is not set"))?,
        };
        let payer = load_keypair(&keypair_path)?;

        let (program_id, program_so_path) = match (self.program_id, &self.program_keypair_path) {
            (Some(id), _) => (id, None),
            (None, path) => {
                let path = path.clone().unwrap_or_else(|| Path::new(PROGRAM_DIR).join(PROGRAM_KEYPAIR_NAME));
                let program = load_keypair(&path).map_err(|e| {
                    FlashloanError::configuration(format!("{e}; program may need to be deployed"))
                })?;
                let so = path.parent().map(|dir| dir.join(PROGRAM_SO_NAME));
                (program.pubkey(), so)
            }
        };

        Ok(Identity {
            rpc_url,
            commitment,
            payer,
            program_id,
            program_so_path,
        })
    }
}

pub fn load_keypair(path: &Path) -> FlashloanResult<Keypair> {
    read_keypair_file(path)
        .map_err(|e| FlashloanError::configuration(format!("failed to read keypair at '{}': {e}", path.display())))
}

/// Expand cluster monikers to their public RPC URLs.
pub fn normalize_rpc_url(url_or_moniker: &str) -> String {
    match url_or_moniker.trim() {
        "m" | "mainnet-beta" => "https://api.mainnet-beta.solana.com".to_string(),
        "t" | "testnet" => "https://api.testnet.solana.com".to_string(),
        "d" | "devnet" => "https://api.devnet.solana.com".to_string(),
        "l" | "localhost" => DEFAULT_RPC_URL.to_string(),
        other => other.to_string(),
    }
}

fn parse_commitment(level: &str) -> FlashloanResult<CommitmentConfig> {
    let commitment = match level {
        "processed" => CommitmentLevel::Processed,
        "confirmed" => CommitmentLevel::Confirmed,
        "finalized" => CommitmentLevel::Finalized,
        other => return Err(FlashloanError::configuration(format!("unknown commitment level: {other}"))),
    };
    Ok(CommitmentConfig { commitment })
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use solana_sdk::signature::write_keypair_file;

    #[test]
    fn monikers_expand() {
        assert_eq!(normalize_rpc_url("devnet"), "https://api.devnet.solana.com");
        assert_eq!(normalize_rpc_url("localhost"), DEFAULT_RPC_URL);
        assert_eq!(normalize_rpc_url("http://10.0.0.1:8899"), "http://10.0.0.1:8899");
    }

    #[test]
    fn resolves_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let payer = Keypair::new();
        let program = Keypair::new();
        let payer_path = dir.path().join("id.json");
        let program_path = dir.path().join("program-keypair.json");
        write_keypair_file(&payer, &payer_path).unwrap();
        write_keypair_file(&program, &program_path).unwrap();

        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            format!(
                "---\njson_rpc_url: devnet\nwebsocket_url: ''\nkeypair_path: {}\ncommitment: finalized\n",
                payer_path.display()
            ),
        )
        .unwrap();

        let identity = IdentitySource {
            config_path: Some(config_path),
            program_keypair_path: Some(program_path),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        assert_eq!(identity.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(identity.commitment, CommitmentConfig::finalized());
        assert_eq!(identity.payer.pubkey(), payer.pubkey());
        assert_eq!(identity.program_id, program.pubkey());
        assert_eq!(identity.program_so_path, Some(dir.path().join(PROGRAM_SO_NAME)));
    }

    #[test]
    fn explicit_values_win() {
        let dir = tempfile::tempdir().unwrap();
        let payer_path = dir.path().join("payer.json");
        write_keypair_file(&Keypair::new(), &payer_path).unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "json_rpc_url: testnet\n").unwrap();
        let program_id = Pubkey::new_unique();

        let identity = IdentitySource {
            config_path: Some(config_path),
            rpc_url: Some("http://127.0.0.1:9000".to_string()),
            keypair_path: Some(payer_path),
            program_id: Some(program_id),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        assert_eq!(identity.rpc_url, "http://127.0.0.1:9000");
        assert_eq!(identity.program_id, program_id);
        assert!(identity.program_so_path.is_none());
    }

    #[test]
    fn missing_program_keypair_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let payer_path = dir.path().join("payer.json");
        write_keypair_file(&Keypair::new(), &payer_path).unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "{}\n").unwrap();

        let err = IdentitySource {
            config_path: Some(config_path),
            keypair_path: Some(payer_path),
            program_keypair_path: Some(dir.path().join("missing.json")),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert_matches!(err, FlashloanError::Configuration(msg) if msg.contains("program may need to be deployed"));
    }
}
