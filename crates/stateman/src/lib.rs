pub mod adapter;
pub mod diagram;
pub mod env;
pub mod error;
pub mod persistence;
pub mod reference;
pub mod reference_validation;
pub mod resolver;
pub mod service;
pub mod shared_function;
pub mod validation;
pub mod workspace;

pub use adapter::{DiagramRepository, InMemoryRepository};
pub use diagram::{DIAGRAM_EXTENSION, Diagram, DiagramKey, DiagramType, Location};
pub use env::{StatemanConfig, StatemanEnv};
pub use error::StatemanError;
pub use persistence::FilesystemRepository;
pub use reference::{Reference, ReferenceKind, ReferenceParseError, parse_references};
pub use reference_validation::{validate_reference, validate_references};
pub use resolver::ReferenceResolver;
pub use service::{CreateRequest, DiagramService, PromotionOutcome};
pub use shared_function::{SemVer, is_valid_identifier, is_valid_state_name, is_valid_version};
pub use validation::strictness::apply_strictness;
pub use validation::structure::validate_structure;
pub use validation::syntax::validate_syntax;
pub use validation::{
    FindingCode, Strictness, ValidationError, ValidationResult, ValidationWarning, Validator,
};
pub use workspace::RepositoryPaths;
