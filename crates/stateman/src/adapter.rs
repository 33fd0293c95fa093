use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use crate::diagram::{Diagram, DiagramKey, DiagramType, Location};
use crate::error::StatemanError;

/// Storage contract for diagram content.
///
/// Implementations serialize concurrent writes to the same key and guarantee that a read
/// following a successful `exists` either returns complete content or fails cleanly.
pub trait DiagramRepository: Send + Sync {
    fn exists(&self, key: &DiagramKey) -> Result<bool, StatemanError>;
    fn read(&self, key: &DiagramKey) -> Result<String, StatemanError>;
    /// Reads the full diagram including timestamps. References are left unparsed.
    fn load(&self, key: &DiagramKey) -> Result<Diagram, StatemanError>;
    fn write(&self, diagram: &Diagram) -> Result<(), StatemanError>;
    fn move_diagram(
        &self,
        diagram_type: DiagramType,
        name: &str,
        version: &str,
        from: Location,
        to: Location,
    ) -> Result<(), StatemanError>;
    fn delete(&self, key: &DiagramKey) -> Result<(), StatemanError>;
    fn list(
        &self,
        diagram_type: DiagramType,
        location: Location,
    ) -> Result<Vec<Diagram>, StatemanError>;
    fn directory_exists(&self, path: &Path) -> Result<bool, StatemanError>;
    fn create_directory(&self, path: &Path) -> Result<(), StatemanError>;
}

#[derive(Default)]
struct InMemoryState {
    diagrams: BTreeMap<DiagramKey, Diagram>,
    directories: BTreeSet<PathBuf>,
    failing_exists: BTreeSet<DiagramKey>,
    failing_reads: BTreeSet<DiagramKey>,
}

/// Process-local repository. Supports failure injection for exercising degraded paths.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<InMemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` under `key`, replacing any previous diagram.
    pub fn insert(&self, key: DiagramKey, content: impl Into<String>) {
        let diagram = Diagram::new(key.clone(), content);
        self.state.lock().diagrams.insert(key, diagram);
    }

    /// Makes `exists` fail for `key`.
    pub fn fail_exists_for(&self, key: DiagramKey) {
        self.state.lock().failing_exists.insert(key);
    }

    /// Makes `read` and `load` fail for `key` while `exists` keeps succeeding.
    pub fn fail_reads_for(&self, key: DiagramKey) {
        self.state.lock().failing_reads.insert(key);
    }

    pub fn len(&self) -> usize {
        self.state.lock().diagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagramRepository for InMemoryRepository {
    fn exists(&self, key: &DiagramKey) -> Result<bool, StatemanError> {
        let state = self.state.lock();
        if state.failing_exists.contains(key) {
            return Err(StatemanError::Repository(format!(
                "existence check failed for {key}"
            )));
        }
        Ok(state.diagrams.contains_key(key))
    }

    fn read(&self, key: &DiagramKey) -> Result<String, StatemanError> {
        self.load(key).map(|diagram| diagram.content)
    }

    fn load(&self, key: &DiagramKey) -> Result<Diagram, StatemanError> {
        let state = self.state.lock();
        if state.failing_reads.contains(key) {
            return Err(StatemanError::Repository(format!("read failed for {key}")));
        }
        state
            .diagrams
            .get(key)
            .cloned()
            .ok_or_else(|| StatemanError::NotFound(key.clone()))
    }

    fn write(&self, diagram: &Diagram) -> Result<(), StatemanError> {
        self.state
            .lock()
            .diagrams
            .insert(diagram.key.clone(), diagram.clone());
        Ok(())
    }

    fn move_diagram(
        &self,
        diagram_type: DiagramType,
        name: &str,
        version: &str,
        from: Location,
        to: Location,
    ) -> Result<(), StatemanError> {
        let source = DiagramKey::new(diagram_type, name, version, from);
        let target = source.at(to);

        let mut state = self.state.lock();
        if state.diagrams.contains_key(&target) {
            return Err(StatemanError::AlreadyExists(target));
        }
        let mut diagram = state
            .diagrams
            .remove(&source)
            .ok_or_else(|| StatemanError::NotFound(source.clone()))?;
        diagram.key = target.clone();
        diagram.updated_at = Utc::now();
        state.diagrams.insert(target, diagram);
        Ok(())
    }

    fn delete(&self, key: &DiagramKey) -> Result<(), StatemanError> {
        self.state
            .lock()
            .diagrams
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StatemanError::NotFound(key.clone()))
    }

    fn list(
        &self,
        diagram_type: DiagramType,
        location: Location,
    ) -> Result<Vec<Diagram>, StatemanError> {
        Ok(self
            .state
            .lock()
            .diagrams
            .values()
            .filter(|diagram| {
                diagram.key.diagram_type == diagram_type && diagram.key.location == location
            })
            .cloned()
            .collect())
    }

    fn directory_exists(&self, path: &Path) -> Result<bool, StatemanError> {
        Ok(self.state.lock().directories.contains(path))
    }

    fn create_directory(&self, path: &Path) -> Result<(), StatemanError> {
        self.state.lock().directories.insert(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_relocates_and_refuses_to_overwrite() {
        let repo = InMemoryRepository::new();
        repo.insert(DiagramKey::staging("door", "1.0.0"), "@startuml\n@enduml");

        repo.move_diagram(
            DiagramType::StateMachine,
            "door",
            "1.0.0",
            Location::Staging,
            Location::Production,
        )
        .unwrap();
        assert!(!repo.exists(&DiagramKey::staging("door", "1.0.0")).unwrap());
        let moved = repo.load(&DiagramKey::production("door", "1.0.0")).unwrap();
        assert_eq!(moved.key.location, Location::Production);

        repo.insert(DiagramKey::staging("door", "1.0.0"), "again");
        let err = repo
            .move_diagram(
                DiagramType::StateMachine,
                "door",
                "1.0.0",
                Location::Staging,
                Location::Production,
            )
            .unwrap_err();
        assert!(matches!(err, StatemanError::AlreadyExists(_)));
    }

    #[test]
    fn injected_failures_surface_as_repository_errors() {
        let repo = InMemoryRepository::new();
        let key = DiagramKey::production("lock", "1.0.0");
        repo.insert(key.clone(), "content");
        repo.fail_reads_for(key.clone());
        assert!(repo.exists(&key).unwrap());
        assert!(matches!(repo.read(&key), Err(StatemanError::Repository(_))));

        repo.fail_exists_for(key.clone());
        assert!(repo.exists(&key).is_err());
    }

    #[test]
    fn list_filters_by_location() {
        let repo = InMemoryRepository::new();
        repo.insert(DiagramKey::staging("a", "1.0.0"), "");
        repo.insert(DiagramKey::production("b", "1.0.0"), "");
        let staged = repo
            .list(DiagramType::StateMachine, Location::Staging)
            .unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].name(), "a");
    }
}
