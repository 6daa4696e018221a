//! Temporary file management utilities.
//!
//! Thin helpers over the tempfile crate. Everything returned here cleans up
//! after itself on drop, so early returns and errors never leave scratch
//! images or half-written checkpoints behind.

use crate::error::CoreResult;
use std::path::Path;
use tempfile::{Builder as TempFileBuilder, NamedTempFile, TempDir};

/// Creates a scratch directory under the system temp dir. Auto-cleaned when dropped.
pub fn create_temp_dir(prefix: &str) -> CoreResult<TempDir> {
    Ok(TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .tempdir()?)
}

/// Creates a temporary file with prefix and extension in `dir`. Auto-deleted when dropped.
///
/// Creating the file next to its final destination keeps a later `persist`
/// on the same filesystem, which makes the rename atomic.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(temp_file)
}
