use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagram::{DIAGRAM_EXTENSION, Location};
use crate::shared_function::split_name_version;

/// Kind of cross-diagram dependency.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Versioned reference to a promoted diagram.
    Product,
    /// Unversioned reference to a nested sub-diagram.
    Nested,
    /// Anything else, e.g. a kind recorded by a newer tool.
    Unknown(String),
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Product => f.write_str("product"),
            ReferenceKind::Nested => f.write_str("nested"),
            ReferenceKind::Unknown(kind) => write!(f, "unknown({kind})"),
        }
    }
}

/// A dependency declared by an include directive.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    /// Required for product references, empty for nested ones.
    pub version: String,
    pub kind: ReferenceKind,
    /// Declared path with separators normalized to `/`.
    pub path: String,
    /// 1-based line of the directive.
    pub line: usize,
}

impl Reference {
    pub fn product(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut reference = Self {
            name: name.into(),
            version: version.into(),
            kind: ReferenceKind::Product,
            path: String::new(),
            line: 1,
        };
        reference.path = reference.canonical_path().unwrap_or_default();
        reference
    }

    pub fn nested(name: impl Into<String>) -> Self {
        let mut reference = Self {
            name: name.into(),
            version: String::new(),
            kind: ReferenceKind::Nested,
            path: String::new(),
            line: 1,
        };
        reference.path = reference.canonical_path().unwrap_or_default();
        reference
    }

    /// Path the reference is expected to use, or `None` for unknown kinds.
    pub fn canonical_path(&self) -> Option<String> {
        match self.kind {
            ReferenceKind::Product => {
                let stem = format!("{}-{}", self.name, self.version);
                Some(format!(
                    "{}/{stem}/{stem}.{DIAGRAM_EXTENSION}",
                    Location::Production.dir_name()
                ))
            }
            ReferenceKind::Nested => Some(format!(
                "{}/{name}/{name}.{DIAGRAM_EXTENSION}",
                Location::Nested.dir_name(),
                name = self.name
            )),
            ReferenceKind::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unable to parse references on line {line}: {reason}")]
pub struct ReferenceParseError {
    pub line: usize,
    pub reason: String,
}

struct DirectivePatterns {
    include: Regex,
    product: Regex,
    nested: Regex,
}

fn directive_patterns() -> &'static DirectivePatterns {
    static PATTERNS: OnceLock<DirectivePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DirectivePatterns {
        include: Regex::new(r"^!include(?:_many|_once)?\s+(.+?)\s*$").expect("invalid regex"),
        product: Regex::new(r"(?:^|/)products/([^/]+)/([^/]+)\.puml$").expect("invalid regex"),
        nested: Regex::new(r"(?:^|/)nested/([^/]+)/([^/]+)\.puml$").expect("invalid regex"),
    })
}

/// Extracts include directives into references, in order of first appearance.
///
/// Include directives that match neither the product nor the nested layout are ignored here;
/// judging them is left to reference validation. Only content that cannot be scanned at all
/// (embedded NUL bytes) fails.
pub fn parse_references(content: &str) -> Result<Vec<Reference>, ReferenceParseError> {
    let patterns = directive_patterns();
    let mut references = Vec::new();
    let mut seen = BTreeSet::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.contains('\0') {
            return Err(ReferenceParseError {
                line: line_no,
                reason: "content contains NUL bytes".into(),
            });
        }

        let Some(caps) = patterns.include.captures(line.trim()) else {
            continue;
        };
        let path = normalize_directive_path(&caps[1]);
        let Some(reference) = match_reference(patterns, &path, line_no) else {
            continue;
        };

        let identity = (reference.kind.clone(), reference.name.clone(), reference.version.clone());
        if seen.insert(identity) {
            references.push(reference);
        }
    }

    Ok(references)
}

fn match_reference(patterns: &DirectivePatterns, path: &str, line: usize) -> Option<Reference> {
    if let Some(caps) = patterns.product.captures(path) {
        let (dir, stem) = (&caps[1], &caps[2]);
        if dir != stem {
            return None;
        }
        let (name, version) = split_name_version(dir).unwrap_or((dir, ""));
        return Some(Reference {
            name: name.to_string(),
            version: version.to_string(),
            kind: ReferenceKind::Product,
            path: path.to_string(),
            line,
        });
    }

    if let Some(caps) = patterns.nested.captures(path) {
        let (dir, stem) = (&caps[1], &caps[2]);
        if dir != stem {
            return None;
        }
        return Some(Reference {
            name: dir.to_string(),
            version: String::new(),
            kind: ReferenceKind::Nested,
            path: path.to_string(),
            line,
        });
    }

    None
}

/// Strips quoting and normalizes Windows separators.
fn normalize_directive_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('<')
                .and_then(|rest| rest.strip_suffix('>'))
        })
        .unwrap_or(trimmed);
    unquoted.replace('\\', "/")
}
