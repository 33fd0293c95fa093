use std::path::PathBuf;
use std::sync::Arc;

use crate::error::StatemanError;
use crate::persistence::FilesystemRepository;
use crate::service::DiagramService;
use crate::validation::Strictness;

pub const ROOT_VAR: &str = "STATEMAN_ROOT";
pub const STRICTNESS_VAR: &str = "STATEMAN_STRICTNESS";
pub const DEFAULT_ROOT: &str = "./diagrams";

/// Settings resolved from the process environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatemanConfig {
    pub root: PathBuf,
    /// Strictness used when a caller does not pick one.
    pub strictness: Strictness,
}

impl Default for StatemanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            strictness: Strictness::Staging,
        }
    }
}

impl StatemanConfig {
    pub fn from_env() -> Result<Self, StatemanError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StatemanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup(ROOT_VAR) {
            let trimmed = root.trim();
            if trimmed.is_empty() {
                return Err(StatemanError::Config(format!("{ROOT_VAR} must not be empty")));
            }
            config.root = PathBuf::from(trimmed);
        }

        if let Some(raw) = lookup(STRICTNESS_VAR) {
            config.strictness = Strictness::parse_or_default(&raw);
            if raw.parse::<Strictness>().is_err() {
                tracing::warn!(value = %raw, "unrecognized {STRICTNESS_VAR}; using staging");
            }
        }

        Ok(config)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

/// Shared environment components for Stateman operations.
pub struct StatemanEnv {
    pub config: StatemanConfig,
    pub repository: Arc<FilesystemRepository>,
    pub service: DiagramService,
}

impl StatemanEnv {
    /// Initialize the environment from `STATEMAN_*` variables.
    pub fn from_env() -> Result<Self, StatemanError> {
        Self::new(StatemanConfig::from_env()?)
    }

    pub fn new(config: StatemanConfig) -> Result<Self, StatemanError> {
        let repository = Arc::new(FilesystemRepository::new(config.root.clone()));
        repository
            .init()
            .map_err(|err| err.context(format!("initializing {}", config.root.display())))?;
        let service = DiagramService::new(repository.clone());

        Ok(Self {
            config,
            repository,
            service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = StatemanConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StatemanConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = StatemanConfig::from_lookup(lookup(&[
            (ROOT_VAR, "/srv/diagrams"),
            (STRICTNESS_VAR, "production"),
        ]))
        .unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/diagrams"));
        assert_eq!(config.strictness, Strictness::Production);
    }

    #[test]
    fn unknown_strictness_falls_back_to_staging() {
        let config =
            StatemanConfig::from_lookup(lookup(&[(STRICTNESS_VAR, "relaxed")])).unwrap();
        assert_eq!(config.strictness, Strictness::Staging);
    }

    #[test]
    fn empty_root_is_rejected() {
        let err = StatemanConfig::from_lookup(lookup(&[(ROOT_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, StatemanError::Config(_)));
    }

    #[test]
    fn env_initializes_repository_layout() {
        let temp = tempfile::tempdir().unwrap();
        let env = StatemanEnv::new(StatemanConfig::default().with_root(temp.path().join("repo")))
            .unwrap();
        assert!(env.repository.paths().staging_dir().is_dir());
        assert!(env.repository.paths().production_dir().is_dir());
        assert!(env.repository.paths().nested_dir().is_dir());
    }
}
