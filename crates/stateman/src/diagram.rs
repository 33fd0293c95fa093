use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::StatemanError;
use crate::reference::Reference;

/// File extension used by every stored diagram and every include directive.
pub const DIAGRAM_EXTENSION: &str = "puml";

/// Notation family of a stored diagram.
#[derive(
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    JsonSchema,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    #[default]
    StateMachine,
}

impl DiagramType {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramType::StateMachine => "state_machine",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DiagramType::StateMachine => DIAGRAM_EXTENSION,
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage stage of a diagram.
#[derive(
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    JsonSchema,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// In-progress, editable diagrams.
    #[default]
    Staging,
    /// Promoted diagrams. Product references resolve here.
    Production,
    /// Unversioned sub-diagrams embedded by other diagrams.
    Nested,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Staging, Location::Production, Location::Nested];

    /// Directory segment for this location under the repository root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Location::Staging => "staging",
            Location::Production => "products",
            Location::Nested => "nested",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Staging => "staging",
            Location::Production => "production",
            Location::Nested => "nested",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = StatemanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "staging" => Ok(Location::Staging),
            "production" | "products" => Ok(Location::Production),
            "nested" => Ok(Location::Nested),
            other => Err(StatemanError::InvalidLocation(format!(
                "unknown location '{other}' (expected staging, production, or nested)"
            ))),
        }
    }
}

/// Identity of a stored diagram. Unique within a repository.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagramKey {
    pub diagram_type: DiagramType,
    pub name: String,
    /// Empty for nested diagrams.
    pub version: String,
    pub location: Location,
}

impl DiagramKey {
    pub fn new(
        diagram_type: DiagramType,
        name: impl Into<String>,
        version: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            diagram_type,
            name: name.into(),
            version: version.into(),
            location,
        }
    }

    pub fn staging(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(DiagramType::StateMachine, name, version, Location::Staging)
    }

    pub fn production(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(DiagramType::StateMachine, name, version, Location::Production)
    }

    pub fn nested(name: impl Into<String>) -> Self {
        Self::new(DiagramType::StateMachine, name, "", Location::Nested)
    }

    /// Same diagram identity at another location.
    pub fn at(&self, location: Location) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }

    /// `{name}-{version}` for versioned diagrams, `{name}` otherwise.
    pub fn stem(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}-{}", self.name, self.version)
        }
    }

    /// Repository-relative path following `{location}/{stem}/{stem}.{ext}`.
    pub fn relative_path(&self) -> String {
        let stem = self.stem();
        format!(
            "{}/{stem}/{stem}.{}",
            self.location.dir_name(),
            self.diagram_type.extension()
        )
    }
}

impl fmt::Display for DiagramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}:{}@{}", self.diagram_type, self.name, self.location)
        } else {
            write!(
                f,
                "{}:{}-{}@{}",
                self.diagram_type, self.name, self.version, self.location
            )
        }
    }
}

/// A state-machine diagram together with its parsed references.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Diagram {
    pub key: DiagramKey,
    pub content: String,
    /// Recomputed on every parse; never maintained incrementally.
    #[serde(default)]
    pub references: Vec<Reference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Diagram {
    pub fn new(key: DiagramKey, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key,
            content: content.into(),
            references: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn version(&self) -> &str {
        &self.key.version
    }

    pub fn location(&self) -> Location {
        self.key.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_follows_location_convention() {
        assert_eq!(
            DiagramKey::staging("door", "1.0.0").relative_path(),
            "staging/door-1.0.0/door-1.0.0.puml"
        );
        assert_eq!(
            DiagramKey::production("door", "1.0.0").relative_path(),
            "products/door-1.0.0/door-1.0.0.puml"
        );
        assert_eq!(
            DiagramKey::nested("latch").relative_path(),
            "nested/latch/latch.puml"
        );
    }

    #[test]
    fn location_parses_aliases_and_rejects_unknown() {
        assert_eq!("products".parse::<Location>().unwrap(), Location::Production);
        assert_eq!(" Staging ".parse::<Location>().unwrap(), Location::Staging);
        assert!("archive".parse::<Location>().is_err());
    }
}
