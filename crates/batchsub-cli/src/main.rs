use std::process::ExitCode;

use batchsub_cli::{failure_code, init_tracing, run, Cli};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.log_format) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(&cli) {
        Ok(outcome) => {
            print!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            eprintln!("error: {e:#}");
            ExitCode::from(failure_code(&e))
        }
    }
}
