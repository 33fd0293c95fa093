use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::adapter::DiagramRepository;
use crate::diagram::{Diagram, DiagramKey, DiagramType, Location};
use crate::error::StatemanError;
use crate::shared_function::split_name_version;
use crate::workspace::{RepositoryPaths, ensure_safe_segment};

/// Stores diagrams as files under `{root}/{location}/{stem}/{stem}.puml`.
///
/// Mutations are serialized through a single lock; writes land in a sibling temp file and are
/// renamed into place so readers never observe partial content.
pub struct FilesystemRepository {
    paths: RepositoryPaths,
    write_lock: Mutex<()>,
}

impl FilesystemRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: RepositoryPaths::new(root),
            write_lock: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &RepositoryPaths {
        &self.paths
    }

    /// Creates the root and every location directory.
    pub fn init(&self) -> Result<(), StatemanError> {
        for location in Location::ALL {
            fs::create_dir_all(self.paths.location_dir(location))?;
        }
        Ok(())
    }

    fn checked_path(&self, key: &DiagramKey) -> Result<PathBuf, StatemanError> {
        ensure_safe_segment(&key.name, "name")?;
        ensure_safe_segment(&key.version, "version")?;
        Ok(self.paths.diagram_path(key))
    }

    fn resolve_dir(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.root().join(path)
        }
    }

    fn key_for_stem(
        diagram_type: DiagramType,
        location: Location,
        stem: &str,
    ) -> Option<DiagramKey> {
        match location {
            Location::Nested => Some(DiagramKey::new(diagram_type, stem, "", location)),
            _ => {
                let (name, version) = split_name_version(stem)?;
                Some(DiagramKey::new(diagram_type, name, version, location))
            }
        }
    }
}

impl DiagramRepository for FilesystemRepository {
    fn exists(&self, key: &DiagramKey) -> Result<bool, StatemanError> {
        Ok(self.checked_path(key)?.is_file())
    }

    fn read(&self, key: &DiagramKey) -> Result<String, StatemanError> {
        let path = self.checked_path(key)?;
        fs::read_to_string(&path).map_err(|err| not_found_or(err, key, &path))
    }

    fn load(&self, key: &DiagramKey) -> Result<Diagram, StatemanError> {
        let path = self.checked_path(key)?;
        let content = fs::read_to_string(&path).map_err(|err| not_found_or(err, key, &path))?;
        let metadata = fs::metadata(&path)?;
        let updated_at: DateTime<Utc> = metadata.modified()?.into();
        let created_at: DateTime<Utc> = metadata
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or(updated_at);

        Ok(Diagram {
            key: key.clone(),
            content,
            references: Vec::new(),
            created_at,
            updated_at,
        })
    }

    fn write(&self, diagram: &Diagram) -> Result<(), StatemanError> {
        let path = self.checked_path(&diagram.key)?;
        let _guard = self.write_lock.lock();
        write_body(&path, &diagram.content)?;
        tracing::debug!(path = %path.display(), "wrote diagram");
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
        let source_path = self.checked_path(&source)?;
        let target_path = self.checked_path(&target)?;

        let _guard = self.write_lock.lock();
        if !source_path.is_file() {
            return Err(StatemanError::NotFound(source));
        }
        if target_path.exists() {
            return Err(StatemanError::AlreadyExists(target));
        }
        if let Some(dir) = target_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::rename(&source_path, &target_path)?;
        remove_empty_dir(source_path.parent())?;
        tracing::debug!(
            from = %source_path.display(),
            to = %target_path.display(),
            "moved diagram"
        );
        Ok(())
    }

    fn delete(&self, key: &DiagramKey) -> Result<(), StatemanError> {
        let path = self.checked_path(key)?;
        let _guard = self.write_lock.lock();
        fs::remove_file(&path).map_err(|err| not_found_or(err, key, &path))?;
        remove_empty_dir(path.parent())?;
        Ok(())
    }

    fn list(
        &self,
        diagram_type: DiagramType,
        location: Location,
    ) -> Result<Vec<Diagram>, StatemanError> {
        let dir = self.paths.location_dir(location);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut diagrams = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let stem = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = Self::key_for_stem(diagram_type, location, &stem) else {
                tracing::debug!(entry = %stem, "skipping directory without name-version layout");
                continue;
            };
            if !self.paths.diagram_path(&key).is_file() {
                continue;
            }
            diagrams.push(self.load(&key)?);
        }

        diagrams.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(diagrams)
    }

    fn directory_exists(&self, path: &Path) -> Result<bool, StatemanError> {
        Ok(self.resolve_dir(path).is_dir())
    }

    fn create_directory(&self, path: &Path) -> Result<(), StatemanError> {
        fs::create_dir_all(self.resolve_dir(path))?;
        Ok(())
    }
}

fn write_body(path: &Path, body: &str) -> Result<(), StatemanError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let staged = path.with_extension("tmp");
    fs::write(&staged, body)?;
    fs::rename(&staged, path)?;
    Ok(())
}

fn remove_empty_dir(dir: Option<&Path>) -> Result<(), StatemanError> {
    let Some(dir) = dir else {
        return Ok(());
    };
    if fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
    }
    Ok(())
}

fn not_found_or(err: std::io::Error, key: &DiagramKey, path: &Path) -> StatemanError {
    if err.kind() == ErrorKind::NotFound {
        StatemanError::NotFound(key.clone())
    } else {
        StatemanError::Repository(format!("{}: {err}", path.display()))
    }
}
