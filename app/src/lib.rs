//! FILENAME: app/src/lib.rs
//! drilldown: command-line front end for hierarchical rollups and breakdowns.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;


use clap::Parser;

pub use cli::{Cli, Command};
pub use commands::{execute, run_breakdown, run_columns, run_tree};
pub use config::DrilldownConfig;
pub use error::AppError;

/// Parses the command line, runs the command and returns the exit status.
pub fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("warning: logging unavailable: {}", e);
    }
    log::debug!(target: "app", "drilldown {} starting", env!("CARGO_PKG_VERSION"));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match execute(&cli.command, &mut out) {
        Ok(()) => 0,
        Err(e) => {
            log::debug!(target: "app", "command failed: {:?}", e);
            eprintln!("error: {}", e);
            1
        }
    }
}
