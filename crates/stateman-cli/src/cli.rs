use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::commands;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "stateman";

pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments, opens the diagram repository, and dispatches to the selected
/// command. Returns a `sysexits`-compatible `ExitCode`.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let root_override = matches.get_one::<String>("root").cloned();
    let session = CliSession::bootstrap(root_override, verbosity)?;
    if session.verbosity.verbose {
        let paths = session.env.repository.paths();
        tracing::info!(
            root = %paths.root().display(),
            staging_dir = %paths.staging_dir().display(),
            production_dir = %paths.production_dir().display(),
            nested_dir = %paths.nested_dir().display(),
            strictness = %session.env.config.strictness,
            "resolved repository layout"
        );
    }

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new(NAME)
        .about("Stateman CLI: validate, store, and promote state-machine diagrams")
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("PATH")
                .global(true)
                .help("Repository root. Defaults to STATEMAN_ROOT or ./diagrams."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit JSON instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Log the resolved repository layout."),
        )
        .subcommand_required(true)
        .subcommand(commands::validate::command())
        .subcommand(commands::diagram::create_command())
        .subcommand(commands::diagram::update_command())
        .subcommand(commands::diagram::show_command())
        .subcommand(commands::diagram::list_command())
        .subcommand(commands::diagram::delete_command())
        .subcommand(commands::promote::command())
}

fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("validate", sub)) => commands::validate::run(session, sub),
        Some(("create", sub)) => commands::diagram::run_create(session, sub),
        Some(("update", sub)) => commands::diagram::run_update(session, sub),
        Some(("show", sub)) => commands::diagram::run_show(session, sub),
        Some(("list", sub)) => commands::diagram::run_list(session, sub),
        Some(("delete", sub)) => commands::diagram::run_delete(session, sub),
        Some(("promote", sub)) => commands::promote::run(session, sub),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
