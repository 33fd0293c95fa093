use std::fs;
use std::path::Path;

use clap::ArgMatches;
use stateman::shared_function::split_name_version;
use stateman::{DiagramKey, DiagramType, Location, RepositoryPaths, Strictness};

use crate::error::{CliError, ExitStatus};

/// Identity used for free-standing files whose name carries no `{name}-{version}` stem.
const FALLBACK_NAME: &str = "diagram";
const FALLBACK_VERSION: &str = "0.0.0";

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

pub fn parse_strictness(value: &str) -> Result<Strictness, CliError> {
    value
        .parse::<Strictness>()
        .map_err(|err| {
            CliError::new(
                format!("{err} (expected staging or production)"),
                ExitStatus::Usage,
            )
        })
}

pub fn parse_location(value: &str) -> Result<Location, CliError> {
    value.parse::<Location>().map_err(CliError::from)
}

/// Reads the `--location` flag, defaulting to staging.
pub fn location_arg(matches: &ArgMatches) -> Result<Location, CliError> {
    match matches.get_one::<String>("location") {
        Some(value) => parse_location(value),
        None => Ok(Location::Staging),
    }
}

/// Builds the key addressed by `<NAME> [VERSION]` at `location`.
///
/// Nested diagrams are unversioned; every other location requires a version.
pub fn key_arg(matches: &ArgMatches, location: Location) -> Result<DiagramKey, CliError> {
    let name = required(matches, "name")?;
    let version = matches.get_one::<String>("version").map(String::as_str);

    match (location, version) {
        (Location::Nested, None) => Ok(DiagramKey::nested(name)),
        (Location::Nested, Some(version)) => Err(CliError::new(
            format!("nested diagrams are unversioned; drop '{version}'"),
            ExitStatus::Usage,
        )),
        (_, Some(version)) => Ok(DiagramKey::new(
            DiagramType::StateMachine,
            name,
            version,
            location,
        )),
        (_, None) => Err(CliError::new(
            format!("{location} diagrams require a version"),
            ExitStatus::Usage,
        )),
    }
}

pub fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str, CliError> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| {
            CliError::new(
                format!("missing required argument <{id}>"),
                ExitStatus::Usage,
            )
        })
}

pub fn read_content(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|err| {
        CliError::new(
            format!("unable to read {}: {err}", path.display()),
            ExitStatus::Io,
        )
    })
}

/// Derives a diagram identity from a `{name}-{version}.puml` file name.
pub fn identity_from_file(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match split_name_version(&stem) {
        Some((name, version)) => (name.to_string(), version.to_string()),
        None if !stem.is_empty() => (stem, FALLBACK_VERSION.to_string()),
        None => (FALLBACK_NAME.to_string(), FALLBACK_VERSION.to_string()),
    }
}

pub fn repository_relative(paths: &RepositoryPaths, key: &DiagramKey) -> String {
    let path = paths.diagram_path(key);
    paths
        .relative(&path)
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
