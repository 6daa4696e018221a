// ============================================================================
// framegrab-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types and Utilities
//
// This module defines the error type used throughout framegrab-core together
// with helper constructors for the common "external command" failure shapes.
//
// KEY COMPONENTS:
// - CoreError: Enum of every failure the library can report
// - CoreResult: Result alias carrying CoreError
// - command_start_error / command_failed_error / command_wait_error helpers
//
// Only a subset of these errors is fatal to a run (source open, input
// missing, invalid configuration, unsupported selection). Everything that
// happens inside a single frame unit is caught at the unit boundary.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by framegrab-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Unable to open video source {path}: {reason}")]
    SourceOpen { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Selection method '{0}' has no frame selection algorithm")]
    UnsupportedSelection(String),

    #[error("Failed to start command '{command}': {source}")]
    CommandStart {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed waiting for command '{command}': {source}")]
    CommandWait {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' failed with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to parse ffprobe output: {0}")]
    FfprobeParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame decode error: {0}")]
    Decode(String),

    #[error("Filter '{filter}' failed: {reason}")]
    Filter { filter: String, reason: String },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for framegrab-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Wraps an I/O error raised while spawning an external command.
pub fn command_start_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandStart {
        command: command.into(),
        source,
    }
}

/// Wraps an I/O error raised while waiting on an external command.
pub fn command_wait_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandWait {
        command: command.into(),
        source,
    }
}

/// Builds the error for a command that ran but exited unsuccessfully.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.into(),
        status,
        stderr: stderr.into(),
    }
}
