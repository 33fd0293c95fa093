use serde::Serialize;
use stateman::{Diagram, Location, Reference, Strictness, ValidationResult};

use crate::error::ExitStatus;

pub mod diagram;
pub mod promote;
pub mod validate;

/// Serializable view of a stored diagram.
#[derive(Clone, Debug, Serialize)]
pub struct DiagramSummary {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub location: Location,
    pub path: String,
    pub updated_at: String,
}

impl DiagramSummary {
    pub fn new(diagram: &Diagram, path: String) -> Self {
        Self {
            name: diagram.key.name.clone(),
            version: diagram.key.version.clone(),
            location: diagram.key.location,
            path,
            updated_at: diagram.updated_at.to_rfc3339(),
        }
    }

    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}-{}", self.name, self.version)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Validation {
        file: String,
        name: String,
        version: String,
        strictness: Strictness,
        valid: bool,
        result: ValidationResult,
    },
    Created {
        summary: DiagramSummary,
        result: ValidationResult,
    },
    Updated {
        summary: DiagramSummary,
        result: ValidationResult,
    },
    Shown {
        summary: DiagramSummary,
        references: Vec<Reference>,
        content: String,
    },
    Listed {
        location: Location,
        diagrams: Vec<DiagramSummary>,
    },
    Deleted {
        summary: DiagramSummary,
    },
    Promoted {
        summary: DiagramSummary,
        result: ValidationResult,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::Validation { valid, .. } => {
                if *valid {
                    ExitStatus::Ok
                } else {
                    ExitStatus::Data
                }
            }
            _ => ExitStatus::Ok,
        }
    }
}
