pub mod strictness;
pub mod structure;
pub mod syntax;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::adapter::DiagramRepository;
use crate::diagram::{Diagram, DiagramKey};
use crate::reference::parse_references;
use crate::reference_validation::validate_references;
use crate::resolver::ReferenceResolver;

pub use strictness::apply_strictness;
pub use structure::validate_structure;
pub use syntax::validate_syntax;

/// Closed catalogue of finding codes. The string forms are a stable external contract.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    MissingStart,
    MissingEnd,
    DuplicateStart,
    DuplicateEnd,
    InvalidOrder,
    InvalidStateName,
    UnknownSyntax,
    NoInitialState,
    NoStates,
    ReferenceParseError,
    InvalidReferenceName,
    MissingReferenceVersion,
    InvalidReferenceVersion,
    SelfReference,
    IncorrectReferencePath,
    UnexpectedNestedVersion,
    NestedSelfReference,
    IncorrectNestedPath,
    UnknownReferenceType,
    NoRepository,
    ReferenceCheckError,
    ReferenceReadError,
    ProductReferenceNotFound,
    NestedReferenceNotFound,
    CircularReference,
    DirectCircularReference,
}

impl FindingCode {
    pub const ALL: [FindingCode; 26] = [
        FindingCode::MissingStart,
        FindingCode::MissingEnd,
        FindingCode::DuplicateStart,
        FindingCode::DuplicateEnd,
        FindingCode::InvalidOrder,
        FindingCode::InvalidStateName,
        FindingCode::UnknownSyntax,
        FindingCode::NoInitialState,
        FindingCode::NoStates,
        FindingCode::ReferenceParseError,
        FindingCode::InvalidReferenceName,
        FindingCode::MissingReferenceVersion,
        FindingCode::InvalidReferenceVersion,
        FindingCode::SelfReference,
        FindingCode::IncorrectReferencePath,
        FindingCode::UnexpectedNestedVersion,
        FindingCode::NestedSelfReference,
        FindingCode::IncorrectNestedPath,
        FindingCode::UnknownReferenceType,
        FindingCode::NoRepository,
        FindingCode::ReferenceCheckError,
        FindingCode::ReferenceReadError,
        FindingCode::ProductReferenceNotFound,
        FindingCode::NestedReferenceNotFound,
        FindingCode::CircularReference,
        FindingCode::DirectCircularReference,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FindingCode::MissingStart => "MISSING_START",
            FindingCode::MissingEnd => "MISSING_END",
            FindingCode::DuplicateStart => "DUPLICATE_START",
            FindingCode::DuplicateEnd => "DUPLICATE_END",
            FindingCode::InvalidOrder => "INVALID_ORDER",
            FindingCode::InvalidStateName => "INVALID_STATE_NAME",
            FindingCode::UnknownSyntax => "UNKNOWN_SYNTAX",
            FindingCode::NoInitialState => "NO_INITIAL_STATE",
            FindingCode::NoStates => "NO_STATES",
            FindingCode::ReferenceParseError => "REFERENCE_PARSE_ERROR",
            FindingCode::InvalidReferenceName => "INVALID_REFERENCE_NAME",
            FindingCode::MissingReferenceVersion => "MISSING_REFERENCE_VERSION",
            FindingCode::InvalidReferenceVersion => "INVALID_REFERENCE_VERSION",
            FindingCode::SelfReference => "SELF_REFERENCE",
            FindingCode::IncorrectReferencePath => "INCORRECT_REFERENCE_PATH",
            FindingCode::UnexpectedNestedVersion => "UNEXPECTED_NESTED_VERSION",
            FindingCode::NestedSelfReference => "NESTED_SELF_REFERENCE",
            FindingCode::IncorrectNestedPath => "INCORRECT_NESTED_PATH",
            FindingCode::UnknownReferenceType => "UNKNOWN_REFERENCE_TYPE",
            FindingCode::NoRepository => "NO_REPOSITORY",
            FindingCode::ReferenceCheckError => "REFERENCE_CHECK_ERROR",
            FindingCode::ReferenceReadError => "REFERENCE_READ_ERROR",
            FindingCode::ProductReferenceNotFound => "PRODUCT_REFERENCE_NOT_FOUND",
            FindingCode::NestedReferenceNotFound => "NESTED_REFERENCE_NOT_FOUND",
            FindingCode::CircularReference => "CIRCULAR_REFERENCE",
            FindingCode::DirectCircularReference => "DIRECT_CIRCULAR_REFERENCE",
        }
    }

    /// Critical findings stay errors under every strictness level.
    pub fn is_critical(self) -> bool {
        match self {
            FindingCode::MissingStart
            | FindingCode::MissingEnd
            | FindingCode::DuplicateStart
            | FindingCode::DuplicateEnd
            | FindingCode::InvalidOrder
            | FindingCode::NoStates
            | FindingCode::SelfReference
            | FindingCode::NestedSelfReference
            | FindingCode::DirectCircularReference
            | FindingCode::CircularReference
            | FindingCode::ReferenceParseError
            | FindingCode::UnknownReferenceType => true,
            FindingCode::InvalidStateName
            | FindingCode::UnknownSyntax
            | FindingCode::NoInitialState
            | FindingCode::InvalidReferenceName
            | FindingCode::MissingReferenceVersion
            | FindingCode::InvalidReferenceVersion
            | FindingCode::IncorrectReferencePath
            | FindingCode::UnexpectedNestedVersion
            | FindingCode::IncorrectNestedPath
            | FindingCode::NoRepository
            | FindingCode::ReferenceCheckError
            | FindingCode::ReferenceReadError
            | FindingCode::ProductReferenceNotFound
            | FindingCode::NestedReferenceNotFound => false,
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding that blocks validity under the strictness it was evaluated with.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationError {
    pub code: FindingCode,
    pub message: String,
    /// 1-based; 1 when the finding is not tied to a line.
    pub line: usize,
    /// 1-based; 1 when the finding is not tied to a column.
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// An informational finding. Never blocks validity.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: FindingCode,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ValidationError {
    pub fn new(code: FindingCode, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            code,
            message: message.into(),
            line: line.max(1),
            column: column.max(1),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl ValidationWarning {
    pub fn new(code: FindingCode, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            code,
            message: message.into(),
            line: line.max(1),
            column: column.max(1),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Per-call accumulator of findings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived from the error list; there is no way to set it directly.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn push_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn add_error(
        &mut self,
        code: FindingCode,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) {
        self.errors
            .push(ValidationError::new(code, message, line, column));
    }

    pub fn add_warning(
        &mut self,
        code: FindingCode,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) {
        self.warnings
            .push(ValidationWarning::new(code, message, line, column));
    }

    pub fn has_error(&self, code: FindingCode) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }

    pub fn has_warning(&self, code: FindingCode) -> bool {
        self.warnings.iter().any(|warning| warning.code == code)
    }

    pub fn error_codes(&self) -> Vec<FindingCode> {
        self.errors.iter().map(|error| error.code).collect()
    }

    pub fn warning_codes(&self) -> Vec<FindingCode> {
        self.warnings.iter().map(|warning| warning.code).collect()
    }

    /// Errors whose codes stay critical regardless of strictness.
    pub fn critical_errors(&self) -> Vec<ValidationError> {
        self.errors
            .iter()
            .filter(|error| error.code.is_critical())
            .cloned()
            .collect()
    }
}

/// Policy controlling whether non-critical errors stay errors.
#[derive(
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    JsonSchema,
    PartialEq,
    Eq,
    Hash,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Every error remains an error.
    #[default]
    Staging,
    /// Only critical errors remain errors; the rest become warnings.
    Production,
}

impl Strictness {
    /// Unrecognized values fall back to [`Strictness::Staging`].
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strictness::Staging => "staging",
            Strictness::Production => "production",
        }
    }
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "staging" | "strict" => Ok(Strictness::Staging),
            "production" | "lenient" => Ok(Strictness::Production),
            other => Err(format!("unknown strictness '{other}'")),
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs every validation pass over a diagram and applies the strictness policy.
#[derive(Clone, Default)]
pub struct Validator {
    resolver: ReferenceResolver,
}

impl Validator {
    /// Validator without a repository. Diagrams that declare references receive a
    /// `NO_REPOSITORY` warning instead of resolution findings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(repository: Arc<dyn DiagramRepository>) -> Self {
        Self {
            resolver: ReferenceResolver::new(Some(repository)),
        }
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Validates `diagram`, replacing its reference list with the freshly parsed one.
    pub fn validate(&self, diagram: &mut Diagram, strictness: Strictness) -> ValidationResult {
        let mut result = ValidationResult::new();

        validate_structure(&diagram.content, &mut result);
        validate_syntax(&diagram.content, &mut result);

        match parse_references(&diagram.content) {
            Ok(references) => diagram.references = references,
            Err(err) => {
                diagram.references.clear();
                result.add_error(FindingCode::ReferenceParseError, err.to_string(), err.line, 1);
            }
        }

        validate_references(diagram, &mut result);

        if !diagram.references.is_empty() {
            self.resolver.resolve(diagram, &mut result);
        }

        apply_strictness(&mut result, strictness);

        tracing::debug!(
            diagram = %diagram.key,
            %strictness,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated diagram"
        );
        result
    }

    /// Validates free-standing content as if it were the staging diagram `name`-`version`.
    pub fn validate_content(
        &self,
        content: &str,
        name: &str,
        version: &str,
        strictness: Strictness,
    ) -> ValidationResult {
        let mut diagram = Diagram::new(DiagramKey::staging(name, version), content);
        self.validate(&mut diagram, strictness)
    }
}
