use std::path::{Path, PathBuf};

use crate::diagram::{DiagramKey, Location};
use crate::error::StatemanError;

/// Canonical paths for a diagram repository rooted at a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryPaths {
    root: PathBuf,
}

impl RepositoryPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the repository root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical staging directory (`{root}/staging`).
    pub fn staging_dir(&self) -> PathBuf {
        self.location_dir(Location::Staging)
    }

    /// Canonical production directory (`{root}/products`).
    pub fn production_dir(&self) -> PathBuf {
        self.location_dir(Location::Production)
    }

    /// Canonical nested diagram directory (`{root}/nested`).
    pub fn nested_dir(&self) -> PathBuf {
        self.location_dir(Location::Nested)
    }

    pub fn location_dir(&self, location: Location) -> PathBuf {
        self.root.join(location.dir_name())
    }

    /// `{root}/{location}/{stem}`
    pub fn diagram_dir(&self, key: &DiagramKey) -> PathBuf {
        self.location_dir(key.location).join(key.stem())
    }

    /// `{root}/{location}/{stem}/{stem}.{ext}`
    pub fn diagram_path(&self, key: &DiagramKey) -> PathBuf {
        let stem = key.stem();
        self.diagram_dir(key)
            .join(format!("{stem}.{}", key.diagram_type.extension()))
    }

    /// Path relative to the root with `/` separators, when `path` lives under the root.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        Some(
            relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }
}

/// Rejects names and versions that would escape their directory.
pub fn ensure_safe_segment(value: &str, field: &str) -> Result<(), StatemanError> {
    if value.contains('/') || value.contains('\\') {
        return Err(StatemanError::Repository(format!(
            "{field} '{value}' must not contain path separators"
        )));
    }
    if value == "." || value == ".." {
        return Err(StatemanError::Repository(format!(
            "{field} '{value}' is not a valid path segment"
        )));
    }
    Ok(())
}
