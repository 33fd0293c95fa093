use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::util;

pub fn command() -> Command {
    Command::new("validate")
        .about("Validate a diagram file and resolve its references against the repository")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .required(true)
                .help("Diagram file to validate"),
        )
        .arg(
            Arg::new("strictness")
                .long("strictness")
                .value_name("LEVEL")
                .help("staging (default) or production. Overrides STATEMAN_STRICTNESS."),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .requires("version")
                .help("Diagram name used for self-reference checks. Defaults to the file stem."),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .value_name("VERSION")
                .requires("name")
                .help("Diagram version used for self-reference checks."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let file = PathBuf::from(util::required(matches, "file")?);
    if !file.is_file() {
        return Err(CliError::new(
            format!("{} is not a file", file.display()),
            ExitStatus::Usage,
        ));
    }
    let content = util::read_content(&file)?;

    let strictness = match matches.get_one::<String>("strictness") {
        Some(value) => util::parse_strictness(value)?,
        None => session.env.config.strictness,
    };

    let (name, version) = match (
        matches.get_one::<String>("name"),
        matches.get_one::<String>("version"),
    ) {
        (Some(name), Some(version)) => (name.clone(), version.clone()),
        _ => util::identity_from_file(&file),
    };

    let result = session
        .env
        .service
        .validator()
        .validate_content(&content, &name, &version, strictness);

    Ok(CommandResult::Validation {
        file: file.display().to_string(),
        name,
        version,
        strictness,
        valid: result.is_valid(),
        result,
    })
}
