use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};
use stateman::{CreateRequest, Diagram, DiagramKey, DiagramType};

use crate::commands::{CommandResult, DiagramSummary};
use crate::context::CliSession;
use crate::error::CliError;
use crate::util;

fn name_arg() -> Arg {
    Arg::new("name")
        .value_name("NAME")
        .required(true)
        .help("Diagram name")
}

fn version_arg() -> Arg {
    Arg::new("version")
        .value_name("VERSION")
        .help("Diagram version (major.minor.patch[-prerelease]); omit for nested diagrams")
}

fn file_arg() -> Arg {
    Arg::new("file")
        .long("file")
        .short('f')
        .value_name("PATH")
        .required(true)
        .help("File holding the diagram content")
}

fn location_flag() -> Arg {
    Arg::new("location")
        .long("location")
        .value_name("LOCATION")
        .help("staging (default), production, or nested")
}

pub fn create_command() -> Command {
    Command::new("create")
        .about("Store a new staging or nested diagram and report its findings")
        .arg(name_arg())
        .arg(version_arg())
        .arg(file_arg())
        .arg(location_flag())
}

pub fn update_command() -> Command {
    Command::new("update")
        .about("Replace the content of a staging or nested diagram")
        .arg(name_arg())
        .arg(version_arg())
        .arg(file_arg())
        .arg(location_flag())
}

pub fn show_command() -> Command {
    Command::new("show")
        .about("Print a stored diagram with its parsed references")
        .arg(name_arg())
        .arg(version_arg())
        .arg(location_flag())
}

pub fn list_command() -> Command {
    Command::new("list")
        .about("List diagrams stored at a location")
        .arg(location_flag())
}

pub fn delete_command() -> Command {
    Command::new("delete")
        .about("Remove a stored diagram")
        .arg(name_arg())
        .arg(version_arg())
        .arg(location_flag())
}

pub fn run_create(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let content = util::read_content(&PathBuf::from(util::required(matches, "file")?))?;
    let location = util::location_arg(matches)?;
    let key = util::key_arg(matches, location)?;
    let request = CreateRequest {
        diagram_type: key.diagram_type,
        name: key.name,
        version: key.version,
        location: key.location,
        content,
    };

    let (diagram, result) = session.env.service.create(request)?;
    Ok(CommandResult::Created {
        summary: summarize(session, &diagram),
        result,
    })
}

pub fn run_update(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let content = util::read_content(&PathBuf::from(util::required(matches, "file")?))?;
    let location = util::location_arg(matches)?;
    let key = util::key_arg(matches, location)?;

    let (diagram, result) = session.env.service.update(&key, content)?;
    Ok(CommandResult::Updated {
        summary: summarize(session, &diagram),
        result,
    })
}

pub fn run_show(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let location = util::location_arg(matches)?;
    let key = util::key_arg(matches, location)?;

    let diagram = session.env.service.get(&key)?;
    Ok(CommandResult::Shown {
        summary: summarize(session, &diagram),
        references: diagram.references,
        content: diagram.content,
    })
}

pub fn run_list(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let location = util::location_arg(matches)?;
    let diagrams = session
        .env
        .service
        .list(DiagramType::StateMachine, location)?
        .iter()
        .map(|diagram| summarize(session, diagram))
        .collect();

    Ok(CommandResult::Listed {
        location,
        diagrams,
    })
}

pub fn run_delete(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let location = util::location_arg(matches)?;
    let key = util::key_arg(matches, location)?;

    let diagram = session.env.service.get(&key)?;
    let summary = summarize(session, &diagram);
    session.env.service.delete(&key)?;
    Ok(CommandResult::Deleted { summary })
}

pub(crate) fn summarize(session: &CliSession, diagram: &Diagram) -> DiagramSummary {
    DiagramSummary::new(diagram, relative_path(session, &diagram.key))
}

fn relative_path(session: &CliSession, key: &DiagramKey) -> String {
    util::repository_relative(session.env.repository.paths(), key)
}
