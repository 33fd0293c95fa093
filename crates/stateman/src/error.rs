use std::fmt;

use thiserror::Error;

use crate::diagram::DiagramKey;
use crate::validation::ValidationError;

/// High-level error type shared across Stateman components.
///
/// Malformed diagram content never surfaces here; it is reported through
/// [`crate::ValidationResult`] findings instead. These variants cover repository and
/// workflow failures only.
#[derive(Debug, Error)]
pub enum StatemanError {
    #[error("diagram not found: {0}")]
    NotFound(DiagramKey),
    #[error("diagram already exists: {0}")]
    AlreadyExists(DiagramKey),
    #[error("invalid diagram identity: {0}")]
    InvalidIdentity(String),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
    #[error("promotion of {key} blocked by {} critical finding(s): {}", blocking.len(), describe(blocking))]
    PromotionBlocked {
        key: DiagramKey,
        blocking: Vec<ValidationError>,
    },
    #[error("repository error: {0}")]
    Repository(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StatemanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl StatemanError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            StatemanError::InvalidIdentity(msg) => {
                StatemanError::InvalidIdentity(format!("{ctx}: {msg}"))
            }
            StatemanError::InvalidLocation(msg) => {
                StatemanError::InvalidLocation(format!("{ctx}: {msg}"))
            }
            StatemanError::Repository(msg) => StatemanError::Repository(format!("{ctx}: {msg}")),
            StatemanError::Config(msg) => StatemanError::Config(format!("{ctx}: {msg}")),
            StatemanError::Serialization(msg) => {
                StatemanError::Serialization(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }
}

fn describe(findings: &[ValidationError]) -> String {
    findings
        .iter()
        .map(|finding| format!("{} (line {})", finding.code, finding.line))
        .collect::<Vec<_>>()
        .join(", ")
}
