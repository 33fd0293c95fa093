use crate::validation::{Strictness, ValidationResult, ValidationWarning};

/// Prefix added to the message of every error downgraded under production strictness.
pub const DOWNGRADE_PREFIX: &str = "downgraded: ";

/// Reclassifies findings for the given strictness.
///
/// Staging leaves the result untouched. Production keeps critical errors and turns every other
/// error into a warning carrying the same code, position, and context. Warnings are never
/// promoted, so re-applying the filter is a no-op.
pub fn apply_strictness(result: &mut ValidationResult, strictness: Strictness) {
    match strictness {
        Strictness::Staging => {}
        Strictness::Production => {
            let (critical, downgradable): (Vec<_>, Vec<_>) = std::mem::take(&mut result.errors)
                .into_iter()
                .partition(|error| error.code.is_critical());

            result.errors = critical;
            result
                .warnings
                .extend(downgradable.into_iter().map(|error| ValidationWarning {
                    code: error.code,
                    message: format!("{DOWNGRADE_PREFIX}{}", error.message),
                    line: error.line,
                    column: error.column,
                    context: error.context,
                }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FindingCode, ValidationError};

    fn mixed() -> ValidationResult {
        let mut result = ValidationResult::new();
        result.add_error(FindingCode::InvalidReferenceVersion, "bad version", 4, 1);
        result.push_error(
            ValidationError::new(FindingCode::ProductReferenceNotFound, "missing", 5, 2)
                .with_context("products/x-1.0.0/x-1.0.0.puml"),
        );
        result.add_error(FindingCode::SelfReference, "self", 6, 1);
        result.add_warning(FindingCode::NoRepository, "no repo", 1, 1);
        result
    }

    #[test]
    fn staging_keeps_every_error() {
        let mut result = mixed();
        apply_strictness(&mut result, Strictness::Staging);
        assert_eq!(result, mixed());
        assert!(!result.is_valid());
    }

    #[test]
    fn production_downgrades_non_critical_errors() {
        let mut result = mixed();
        apply_strictness(&mut result, Strictness::Production);

        assert_eq!(result.error_codes(), vec![FindingCode::SelfReference]);
        assert_eq!(
            result.warning_codes(),
            vec![
                FindingCode::NoRepository,
                FindingCode::InvalidReferenceVersion,
                FindingCode::ProductReferenceNotFound,
            ]
        );

        let downgraded = &result.warnings[2];
        assert_eq!(downgraded.message, "downgraded: missing");
        assert_eq!((downgraded.line, downgraded.column), (5, 2));
        assert_eq!(
            downgraded.context.as_deref(),
            Some("products/x-1.0.0/x-1.0.0.puml")
        );
        assert!(!result.is_valid());
    }

    #[test]
    fn production_is_valid_without_critical_errors() {
        let mut result = ValidationResult::new();
        result.add_error(FindingCode::NestedReferenceNotFound, "missing", 2, 1);
        apply_strictness(&mut result, Strictness::Production);
        assert!(result.is_valid());
    }

    #[test]
    fn reapplying_production_is_a_no_op() {
        let mut once = mixed();
        apply_strictness(&mut once, Strictness::Production);
        let mut twice = once.clone();
        apply_strictness(&mut twice, Strictness::Production);
        assert_eq!(once, twice);
    }

    #[test]
    fn production_errors_are_a_subset_of_staging_errors() {
        let mut staging = mixed();
        apply_strictness(&mut staging, Strictness::Staging);
        let mut production = mixed();
        apply_strictness(&mut production, Strictness::Production);
        assert!(
            production
                .errors
                .iter()
                .all(|error| staging.errors.contains(error))
        );
    }
}
