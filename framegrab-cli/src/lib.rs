// framegrab-cli/src/lib.rs
//
// Library portion of the framegrab CLI application.
// Contains argument definitions, config merging and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::Cli;
pub use commands::extract::run_extract;
pub use config::{FileConfig, RunOptions, load_file_config, resolve_options};
