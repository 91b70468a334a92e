//! typealign - score entity clustering and typing output
//!
//! # Usage
//!
//! ```bash
//! # Score a system run against gold annotations
//! typealign score log_specifications.txt gold.tab system.tab scores/
//!
//! # Tab-separated tables, a named run, NAM mentions only
//! typealign score -r run1 -S tab --mention-types NAM log_specifications.txt gold.tab system.tab scores/
//!
//! # Validate an annotation file before scoring
//! typealign validate log_specifications.txt segment_boundaries.txt types.txt input.tab output.tab
//! ```

use std::env;
use std::process::ExitCode;

use clap::Parser;

use typealign::cli::commands::{score, validate};
use typealign::cli::output::{color, format_error, init_logging};
use typealign::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let operation = cli.command.name();

    // a rejected run must leave an existing log file untouched
    if let Err(e) = cli.command.check_paths() {
        eprintln!("{}", color("31", &format_error(operation, &e)));
        return ExitCode::FAILURE;
    }
    if let Err(e) = init_logging(&cli.log) {
        eprintln!("{}", color("31", &format_error("logging", &e)));
        return ExitCode::FAILURE;
    }
    log::info!(
        "Execution begins {{current_dir:{}, arguments:{:?}}}",
        env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default(),
        env::args().collect::<Vec<_>>()
    );

    let result = match cli.command {
        Commands::Score(args) => score::run(args),
        Commands::Validate(args) => validate::run(args),
    };

    match result {
        Ok(()) => {
            log::info!("Execution ends");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", color("31", &format_error(operation, &e)));
            ExitCode::FAILURE
        }
    }
}
