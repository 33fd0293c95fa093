use clap::{Arg, ArgMatches, Command};
use stateman::DiagramType;

use crate::commands::CommandResult;
use crate::commands::diagram::summarize;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util;

pub fn command() -> Command {
    Command::new("promote")
        .about("Move a staging diagram to production once it passes production validation")
        .arg(
            Arg::new("name")
                .value_name("NAME")
                .required(true)
                .help("Diagram name"),
        )
        .arg(
            Arg::new("version")
                .value_name("VERSION")
                .required(true)
                .help("Diagram version"),
        )
}

/// Blocked promotions surface as errors carrying the critical findings and exit with
/// `EX_DATAERR`; the staging copy is left untouched.
pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let name = util::required(matches, "name")?;
    let version = util::required(matches, "version")?;

    let outcome = session
        .env
        .service
        .promote(DiagramType::StateMachine, name, version)?;
    let diagram = session.env.service.get(&outcome.key)?;

    Ok(CommandResult::Promoted {
        summary: summarize(session, &diagram),
        result: outcome.result,
    })
}
