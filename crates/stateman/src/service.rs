use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::adapter::DiagramRepository;
use crate::diagram::{Diagram, DiagramKey, DiagramType, Location};
use crate::error::StatemanError;
use crate::reference::parse_references;
use crate::shared_function::{is_valid_identifier, is_valid_version};
use crate::validation::{Strictness, ValidationResult, Validator};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub diagram_type: DiagramType,
    pub name: String,
    /// Empty for nested diagrams.
    #[serde(default)]
    pub version: String,
    /// `Staging` or `Nested`; production copies only come from promotion.
    #[serde(default)]
    pub location: Location,
    pub content: String,
}

/// Outcome of a successful promotion.
#[derive(Clone, Debug, Serialize)]
pub struct PromotionOutcome {
    pub key: DiagramKey,
    /// Findings under production strictness; may still carry warnings.
    pub result: ValidationResult,
}

/// High-level façade that sequences repository access and validation for the diagram
/// lifecycle: create, read, update, delete, list, validate, and promote.
pub struct DiagramService {
    repository: Arc<dyn DiagramRepository>,
    validator: Validator,
}

impl DiagramService {
    pub fn new(repository: Arc<dyn DiagramRepository>) -> Self {
        let validator = Validator::with_repository(repository.clone());
        Self {
            repository,
            validator,
        }
    }

    pub fn repository(&self) -> &Arc<dyn DiagramRepository> {
        &self.repository
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Stores a new staging or nested diagram. Findings are returned, never enforced; the
    /// content stays editable.
    pub fn create(
        &self,
        req: CreateRequest,
    ) -> Result<(Diagram, ValidationResult), StatemanError> {
        let key = DiagramKey::new(req.diagram_type, req.name, req.version, req.location);
        ensure_identity(&key)?;
        if self.repository.exists(&key)? {
            return Err(StatemanError::AlreadyExists(key));
        }

        let dir = PathBuf::from(key.location.dir_name()).join(key.stem());
        if !self.repository.directory_exists(&dir)? {
            self.repository.create_directory(&dir)?;
        }

        let mut diagram = Diagram::new(key, req.content);
        let result = self.validator.validate(&mut diagram, Strictness::Staging);
        self.repository.write(&diagram)?;

        tracing::info!(diagram = %diagram.key, valid = result.is_valid(), "created diagram");
        Ok((diagram, result))
    }

    /// Loads a diagram with its references parsed. Unparseable content loads with no
    /// references; `validate` reports it as `REFERENCE_PARSE_ERROR`.
    pub fn get(&self, key: &DiagramKey) -> Result<Diagram, StatemanError> {
        let mut diagram = self.repository.load(key)?;
        diagram.references = match parse_references(&diagram.content) {
            Ok(references) => references,
            Err(err) => {
                tracing::warn!(diagram = %key, error = %err, "reference parsing failed");
                Vec::new()
            }
        };
        Ok(diagram)
    }

    /// Replaces the content of a staging or nested diagram.
    pub fn update(
        &self,
        key: &DiagramKey,
        content: impl Into<String>,
    ) -> Result<(Diagram, ValidationResult), StatemanError> {
        if key.location == Location::Production {
            return Err(StatemanError::InvalidLocation(format!(
                "{key} is not editable; production diagrams only change through promotion"
            )));
        }

        let existing = self.repository.load(key)?;
        let mut diagram = Diagram {
            key: key.clone(),
            content: content.into(),
            references: Vec::new(),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        let result = self.validator.validate(&mut diagram, Strictness::Staging);
        self.repository.write(&diagram)?;

        tracing::info!(diagram = %diagram.key, valid = result.is_valid(), "updated diagram");
        Ok((diagram, result))
    }

    pub fn delete(&self, key: &DiagramKey) -> Result<(), StatemanError> {
        self.repository.delete(key)?;
        tracing::info!(diagram = %key, "deleted diagram");
        Ok(())
    }

    /// Diagrams at `location`, ordered by name then version.
    pub fn list(
        &self,
        diagram_type: DiagramType,
        location: Location,
    ) -> Result<Vec<Diagram>, StatemanError> {
        let mut diagrams = self.repository.list(diagram_type, location)?;
        diagrams.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(diagrams)
    }

    /// Validates a stored diagram, resolving its references against this repository.
    pub fn validate(
        &self,
        key: &DiagramKey,
        strictness: Strictness,
    ) -> Result<ValidationResult, StatemanError> {
        let mut diagram = self.repository.load(key)?;
        Ok(self.validator.validate(&mut diagram, strictness))
    }

    /// Moves a staging diagram to production once it passes production-strictness validation.
    ///
    /// A blocked promotion reports the critical findings that stopped it.
    pub fn promote(
        &self,
        diagram_type: DiagramType,
        name: &str,
        version: &str,
    ) -> Result<PromotionOutcome, StatemanError> {
        let staging = DiagramKey::new(diagram_type, name, version, Location::Staging);
        let production = staging.at(Location::Production);

        let mut diagram = self.repository.load(&staging)?;
        if self.repository.exists(&production)? {
            return Err(StatemanError::AlreadyExists(production));
        }

        let result = self.validator.validate(&mut diagram, Strictness::Production);
        if !result.is_valid() {
            tracing::warn!(
                diagram = %staging,
                blocking = result.errors.len(),
                "promotion blocked"
            );
            return Err(StatemanError::PromotionBlocked {
                key: staging,
                blocking: result.errors,
            });
        }

        self.repository.move_diagram(
            diagram_type,
            name,
            version,
            Location::Staging,
            Location::Production,
        )?;

        tracing::info!(diagram = %production, warnings = result.warnings.len(), "promoted diagram");
        Ok(PromotionOutcome {
            key: production,
            result,
        })
    }
}

fn ensure_identity(key: &DiagramKey) -> Result<(), StatemanError> {
    let DiagramKey { name, version, .. } = key;
    if !is_valid_identifier(name) {
        return Err(StatemanError::InvalidIdentity(format!(
            "name '{name}' must match [A-Za-z_][A-Za-z0-9_-]*"
        )));
    }
    match key.location {
        Location::Staging if !is_valid_version(version) => {
            Err(StatemanError::InvalidIdentity(format!(
                "version '{version}' must be major.minor.patch[-prerelease]"
            )))
        }
        Location::Nested if !version.is_empty() => Err(StatemanError::InvalidIdentity(
            format!("nested diagram '{name}' is unversioned; got '{version}'"),
        )),
        Location::Production => Err(StatemanError::InvalidLocation(format!(
            "{key} cannot be created directly; promote a staging diagram instead"
        ))),
        Location::Staging | Location::Nested => Ok(()),
    }
}
