use std::process::ExitCode;

use serde_json::json;
use stateman::ValidationResult;

use crate::commands::CommandResult;
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as human-readable text or a single JSON document and converts
/// the outcome into an exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) {
    match result {
        CommandResult::Validation {
            file,
            name,
            version,
            strictness,
            valid,
            result,
        } => {
            let status = if *valid { "OK" } else { "FAIL" };
            println!(
                "Validation {status}: {file} as {name}-{version} ({strictness}, {} error(s), {} warning(s))",
                result.errors.len(),
                result.warnings.len()
            );
            print_findings(result);
        }
        CommandResult::Created { summary, result } => {
            println!("Created diagram '{}' at {}", summary.label(), summary.path);
            print_findings(result);
        }
        CommandResult::Updated { summary, result } => {
            println!("Updated diagram '{}' at {}", summary.label(), summary.path);
            print_findings(result);
        }
        CommandResult::Shown {
            summary,
            references,
            content,
        } => {
            println!(
                "Diagram '{}' ({}) at {}",
                summary.label(),
                summary.location,
                summary.path
            );
            println!("  Updated: {}", summary.updated_at);
            if references.is_empty() {
                println!("  References: (none)");
            } else {
                println!("  References ({}):", references.len());
                for reference in references {
                    println!(
                        "    - {} {} (line {})",
                        reference.kind, reference.path, reference.line
                    );
                }
            }
            println!();
            print!("{content}");
            if !content.ends_with('\n') {
                println!();
            }
        }
        CommandResult::Listed {
            location,
            diagrams,
        } => {
            println!("Diagrams in {location} ({}):", diagrams.len());
            for diagram in diagrams {
                println!("  - {} ({})", diagram.label(), diagram.path);
            }
        }
        CommandResult::Deleted { summary } => {
            println!(
                "Deleted diagram '{}' (removed: {})",
                summary.label(),
                summary.path
            );
        }
        CommandResult::Promoted { summary, result } => {
            println!("Promoted diagram '{}' to {}", summary.label(), summary.path);
            print_findings(result);
        }
    }
}

fn print_findings(result: &ValidationResult) {
    for error in &result.errors {
        println!(
            "  [ERR] {} {}:{} {}{}",
            error.code,
            error.line,
            error.column,
            error.message,
            context_suffix(error.context.as_deref())
        );
    }
    for warning in &result.warnings {
        println!(
            "  [WARN] {} {}:{} {}{}",
            warning.code,
            warning.line,
            warning.column,
            warning.message,
            context_suffix(warning.context.as_deref())
        );
    }
}

fn context_suffix(context: Option<&str>) -> String {
    context.map(|c| format!(" [{c}]")).unwrap_or_default()
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = json!(result);
    println!("{payload}");
    Ok(())
}
