use anyhow::Result;
use clap::{Args, ValueEnum};
use shielded_vault_lib::MockBackend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::backend::Backend;
use crate::decode_hex_32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Keccak attestation, no zero-knowledge (tests and local runs)
    Mock,
    /// SP1 zkVM, Groth16-wrapped
    Sp1,
}

/// Backend selection shared by every binary.
#[derive(Debug, Clone, Args)]
pub struct ProverArgs {
    /// Proving backend
    #[arg(long, env = "VAULT_PROVER", value_enum, default_value_t = BackendKind::Mock)]
    pub prover: BackendKind,

    /// Hex-encoded 32-byte setup key of the mock backend
    #[arg(long, env = "VAULT_MOCK_KEY")]
    pub mock_key: Option<String>,
}

impl ProverArgs {
    pub fn backend(&self) -> Result<Backend> {
        match self.prover {
            BackendKind::Mock => {
                let backend = match &self.mock_key {
                    Some(key) => MockBackend::new(decode_hex_32(key)?),
                    None => MockBackend::default(),
                };
                Ok(Backend::Mock(backend))
            }
            #[cfg(feature = "sp1")]
            BackendKind::Sp1 => Ok(Backend::Sp1(Box::new(crate::sp1::Sp1Backend::from_env()))),
            #[cfg(not(feature = "sp1"))]
            BackendKind::Sp1 => anyhow::bail!("built without the `sp1` feature"),
        }
    }
}

/// Where the e2e run keeps its registry snapshot between runs.
#[derive(Debug, Clone, Args)]
pub struct StateArgs {
    /// Commitment registry snapshot (JSON); loaded if present, written at the end
    #[arg(long, env = "VAULT_STATE")]
    pub state: Option<PathBuf>,
}

/// Install the global `tracing` subscriber; `RUST_LOG` overrides `default`.
pub fn init_tracing(default: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()),
        )
        .init();
}
