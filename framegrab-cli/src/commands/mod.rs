//! Command implementations for the CLI.

/// The screenshot extraction run: download, sample, score, save, summarise.
pub mod extract;
