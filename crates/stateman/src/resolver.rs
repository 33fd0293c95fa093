use std::collections::BTreeSet;
use std::sync::Arc;

use crate::adapter::DiagramRepository;
use crate::diagram::{Diagram, DiagramKey, DiagramType, Location};
use crate::reference::{Reference, ReferenceKind, parse_references};
use crate::validation::{FindingCode, ValidationError, ValidationResult, ValidationWarning};

/// Confirms that references exist in the repository and walks the transitive reference graph
/// looking for cycles.
#[derive(Clone, Default)]
pub struct ReferenceResolver {
    repository: Option<Arc<dyn DiagramRepository>>,
}

impl ReferenceResolver {
    pub fn new(repository: Option<Arc<dyn DiagramRepository>>) -> Self {
        Self { repository }
    }

    pub fn has_repository(&self) -> bool {
        self.repository.is_some()
    }

    /// Resolves the already-parsed references of `diagram`.
    pub fn resolve(&self, diagram: &Diagram, result: &mut ValidationResult) {
        let Some(repository) = self.repository.as_deref() else {
            result.add_warning(
                FindingCode::NoRepository,
                "no repository configured; references were not resolved",
                1,
                1,
            );
            return;
        };

        let root = diagram.key.clone();
        let mut walk = CycleWalk {
            repository,
            root: &root,
            path: Vec::new(),
            reported: BTreeSet::new(),
            result,
        };

        for reference in &diagram.references {
            let Some(target) = target_key(root.diagram_type, reference) else {
                continue;
            };

            match repository.exists(&target) {
                Ok(true) => {}
                Ok(false) => {
                    walk.result.push_error(not_found(reference, &target));
                    continue;
                }
                Err(err) => {
                    tracing::warn!(reference = %target, error = %err, "reference existence check failed");
                    walk.result.push_warning(
                        ValidationWarning::new(
                            FindingCode::ReferenceCheckError,
                            format!("could not check reference {target}: {err}"),
                            reference.line,
                            1,
                        )
                        .with_context(reference.path.clone()),
                    );
                    continue;
                }
            }

            let content = match repository.read(&target) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(reference = %target, error = %err, "reference read failed");
                    walk.result.push_warning(
                        ValidationWarning::new(
                            FindingCode::ReferenceReadError,
                            format!("could not read reference {target}: {err}"),
                            reference.line,
                            1,
                        )
                        .with_context(reference.path.clone()),
                    );
                    continue;
                }
            };

            walk.path.clear();
            walk.path.push(root.clone());
            if target == root {
                walk.report(FindingCode::DirectCircularReference, &target, reference.line);
                continue;
            }
            walk.visit(&target, &content, reference.line);
        }
    }
}

/// Backtracking depth-first walk. `path` only ever holds the active branch, so shared
/// acyclic substructure is explored once per branch and never mistaken for a cycle.
struct CycleWalk<'a> {
    repository: &'a dyn DiagramRepository,
    root: &'a DiagramKey,
    path: Vec<DiagramKey>,
    reported: BTreeSet<(FindingCode, String)>,
    result: &'a mut ValidationResult,
}

impl CycleWalk<'_> {
    fn visit(&mut self, node: &DiagramKey, content: &str, line: usize) {
        if self.path.contains(node) {
            self.report(FindingCode::CircularReference, node, line);
            return;
        }

        self.path.push(node.clone());

        if let Ok(references) = parse_references(content) {
            for reference in &references {
                let Some(child) = target_key(node.diagram_type, reference) else {
                    continue;
                };
                if child == *self.root {
                    self.report(FindingCode::DirectCircularReference, &child, line);
                    continue;
                }
                if self.path.contains(&child) {
                    self.report(FindingCode::CircularReference, &child, line);
                    continue;
                }
                if !matches!(self.repository.exists(&child), Ok(true)) {
                    continue;
                }
                let Ok(child_content) = self.repository.read(&child) else {
                    continue;
                };
                self.visit(&child, &child_content, line);
            }
        }

        self.path.pop();
    }

    /// Records a cycle closing at `closing`. The same cycle is reported once per resolution.
    fn report(&mut self, code: FindingCode, closing: &DiagramKey, line: usize) {
        let chain = self
            .path
            .iter()
            .chain(std::iter::once(closing))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");

        if !self.reported.insert((code, chain.clone())) {
            return;
        }

        let message = match code {
            FindingCode::DirectCircularReference => {
                format!("reference chain leads back to {}", self.root)
            }
            _ => format!("circular reference through {closing}"),
        };
        self.result
            .push_error(ValidationError::new(code, message, line, 1).with_context(chain));
    }
}

/// Repository key a reference resolves to, or `None` for unknown kinds.
pub fn target_key(diagram_type: DiagramType, reference: &Reference) -> Option<DiagramKey> {
    let (location, version) = match &reference.kind {
        ReferenceKind::Product => (Location::Production, reference.version.clone()),
        ReferenceKind::Nested => (Location::Nested, String::new()),
        ReferenceKind::Unknown(_) => return None,
    };
    Some(DiagramKey::new(
        diagram_type,
        reference.name.clone(),
        version,
        location,
    ))
}

fn not_found(reference: &Reference, target: &DiagramKey) -> ValidationError {
    let code = match &reference.kind {
        ReferenceKind::Nested => FindingCode::NestedReferenceNotFound,
        ReferenceKind::Product | ReferenceKind::Unknown(_) => FindingCode::ProductReferenceNotFound,
    };
    ValidationError::new(
        code,
        format!("referenced diagram {target} does not exist"),
        reference.line,
        1,
    )
    .with_context(reference.path.clone())
}
