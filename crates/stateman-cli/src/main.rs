use std::process::ExitCode;

fn main() -> ExitCode {
    stateman_cli::run()
}
