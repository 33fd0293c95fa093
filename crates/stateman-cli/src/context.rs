use stateman::{StatemanConfig, StatemanEnv};

use crate::error::CliError;
use crate::util::Verbosity;

pub struct CliSession {
    pub env: StatemanEnv,
    pub verbosity: Verbosity,
}

impl CliSession {
    /// Resolves configuration from the environment, applies the `--root` override, and opens
    /// the repository (creating its location directories when missing).
    pub fn bootstrap(root_override: Option<String>, verbosity: Verbosity) -> Result<Self, CliError> {
        let mut config = StatemanConfig::from_env()?;
        if let Some(root) = root_override {
            config = config.with_root(root);
        }

        let env = StatemanEnv::new(config)?;
        Ok(Self { env, verbosity })
    }
}
