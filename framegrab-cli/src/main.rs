// ============================================================================
// framegrab-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: framegrab binary
//
// Parses the command line, runs the extraction and maps any error to a red
// message on stderr and exit code 1.

use clap::Parser;
use console::style;
use framegrab_cli::{Cli, run_extract};
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_extract(cli) {
        log::debug!("Run failed: {:?}", e);
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}
