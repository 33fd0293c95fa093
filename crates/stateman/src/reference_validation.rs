use crate::diagram::Diagram;
use crate::reference::{Reference, ReferenceKind};
use crate::shared_function::{is_valid_identifier, is_valid_version};
use crate::validation::{FindingCode, ValidationError, ValidationResult, ValidationWarning};

/// Checks every parsed reference of `diagram` independently, in parse order.
pub fn validate_references(diagram: &Diagram, result: &mut ValidationResult) {
    for reference in &diagram.references {
        validate_reference(reference, diagram.name(), diagram.version(), result);
    }
}

/// Checks one reference against the identity of the diagram that declares it.
pub fn validate_reference(
    reference: &Reference,
    owner_name: &str,
    owner_version: &str,
    result: &mut ValidationResult,
) {
    let line = reference.line;

    if !is_valid_identifier(&reference.name) {
        result.push_error(
            ValidationError::new(
                FindingCode::InvalidReferenceName,
                format!("reference name '{}' is not a valid identifier", reference.name),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        );
        return;
    }

    match &reference.kind {
        ReferenceKind::Product => {
            validate_product(reference, owner_name, owner_version, result)
        }
        ReferenceKind::Nested => validate_nested(reference, owner_name, result),
        ReferenceKind::Unknown(kind) => result.push_error(
            ValidationError::new(
                FindingCode::UnknownReferenceType,
                format!("reference '{}' has unknown type '{kind}'", reference.name),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        ),
    }
}

fn validate_product(
    reference: &Reference,
    owner_name: &str,
    owner_version: &str,
    result: &mut ValidationResult,
) {
    let line = reference.line;

    if reference.version.is_empty() {
        result.push_error(
            ValidationError::new(
                FindingCode::MissingReferenceVersion,
                format!("product reference '{}' has no version", reference.name),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        );
    } else if !is_valid_version(&reference.version) {
        result.push_error(
            ValidationError::new(
                FindingCode::InvalidReferenceVersion,
                format!(
                    "product reference '{}' has invalid version '{}' (expected major.minor.patch[-prerelease])",
                    reference.name, reference.version
                ),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        );
    }

    if reference.name == owner_name && reference.version == owner_version {
        result.push_error(
            ValidationError::new(
                FindingCode::SelfReference,
                format!(
                    "diagram {}-{} references itself",
                    reference.name, reference.version
                ),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        );
    }

    check_path(reference, FindingCode::IncorrectReferencePath, result);
}

fn validate_nested(reference: &Reference, owner_name: &str, result: &mut ValidationResult) {
    let line = reference.line;

    if !reference.version.is_empty() {
        result.push_warning(
            ValidationWarning::new(
                FindingCode::UnexpectedNestedVersion,
                format!(
                    "nested reference '{}' should not carry a version ('{}')",
                    reference.name, reference.version
                ),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        );
    }

    if reference.name == owner_name {
        result.push_error(
            ValidationError::new(
                FindingCode::NestedSelfReference,
                format!("diagram '{}' nests itself", reference.name),
                line,
                1,
            )
            .with_context(reference.path.clone()),
        );
    }

    check_path(reference, FindingCode::IncorrectNestedPath, result);
}

fn check_path(reference: &Reference, code: FindingCode, result: &mut ValidationResult) {
    let Some(expected) = reference.canonical_path() else {
        return;
    };
    if reference.path != expected {
        result.push_warning(
            ValidationWarning::new(
                code,
                format!(
                    "reference path '{}' differs from canonical path '{expected}'",
                    reference.path
                ),
                reference.line,
                1,
            )
            .with_context(expected),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(reference: Reference) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_reference(&reference, "door", "1.0.0", &mut result);
        result
    }

    #[test]
    fn canonical_product_reference_is_clean() {
        let result = check(Reference::product("lock", "2.1.0-rc.1"));
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn invalid_name_skips_remaining_checks() {
        let mut reference = Reference::product("9lock", "latest");
        reference.path = "elsewhere.puml".into();
        let result = check(reference);
        assert_eq!(result.error_codes(), vec![FindingCode::InvalidReferenceName]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn product_version_problems_are_reported() {
        assert_eq!(
            check(Reference::product("lock", "")).error_codes(),
            vec![FindingCode::MissingReferenceVersion]
        );
        assert_eq!(
            check(Reference::product("lock", "1.0")).error_codes(),
            vec![FindingCode::InvalidReferenceVersion]
        );
    }

    #[test]
    fn product_self_reference_is_an_error() {
        let result = check(Reference::product("door", "1.0.0"));
        assert_eq!(result.error_codes(), vec![FindingCode::SelfReference]);
    }

    #[test]
    fn other_version_of_self_is_not_a_self_reference() {
        let result = check(Reference::product("door", "0.9.0"));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn non_canonical_paths_are_warnings() {
        let mut product = Reference::product("lock", "1.0.0");
        product.path = "../products/lock-1.0.0/lock-1.0.0.puml".into();
        assert_eq!(
            check(product).warning_codes(),
            vec![FindingCode::IncorrectReferencePath]
        );

        let mut nested = Reference::nested("latch");
        nested.path = "sub/nested/latch/latch.puml".into();
        assert_eq!(
            check(nested).warning_codes(),
            vec![FindingCode::IncorrectNestedPath]
        );
    }

    #[test]
    fn nested_checks() {
        let mut versioned = Reference::nested("latch");
        versioned.version = "1.0.0".into();
        let result = check(versioned);
        assert!(result.has_warning(FindingCode::UnexpectedNestedVersion));

        let result = check(Reference::nested("door"));
        assert_eq!(result.error_codes(), vec![FindingCode::NestedSelfReference]);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mut reference = Reference::nested("latch");
        reference.kind = ReferenceKind::Unknown("library".into());
        assert_eq!(
            check(reference).error_codes(),
            vec![FindingCode::UnknownReferenceType]
        );
    }

    #[test]
    fn siblings_are_checked_independently() {
        let mut diagram = Diagram::new(crate::DiagramKey::staging("door", "1.0.0"), "");
        diagram.references = vec![
            Reference::product("9bad", "1.0.0"),
            Reference::product("lock", "nope"),
            Reference::nested("door"),
        ];
        let mut result = ValidationResult::new();
        validate_references(&diagram, &mut result);
        assert_eq!(
            result.error_codes(),
            vec![
                FindingCode::InvalidReferenceName,
                FindingCode::InvalidReferenceVersion,
                FindingCode::NestedSelfReference,
            ]
        );
    }
}
