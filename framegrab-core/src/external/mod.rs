// ============================================================================
// framegrab-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools
//
// This module encapsulates interactions with ffmpeg and ffprobe. It provides
// traits and concrete implementations so decoding and filtering can be tested
// without the real binaries.
//
// KEY COMPONENTS:
// - Traits for external tool interactions (FfmpegSpawner, FfmpegProcess)
// - Concrete implementations using ffmpeg-sidecar and ffprobe crates
// - Dependency checking

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, command_start_error};

// ---- Standard library imports ----
use std::ffi::OsStr;
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Contains ffprobe stream inspection
pub mod ffprobe_executor;

/// Mock spawner for exercising ffmpeg call sites without the binary
#[cfg(test)]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{
    FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, command_args,
    run_to_completion,
};
pub use ffprobe_executor::{VideoStreamInfo, parse_frame_rate, probe_video_stream};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs the command with `-version` and discards its output. Used to warn
/// early when ffmpeg is missing; filters degrade gracefully either way.
pub fn check_dependency<S: AsRef<OsStr>>(cmd_name: S) -> CoreResult<()> {
    let cmd_name = cmd_name.as_ref();
    let display_name = cmd_name.to_string_lossy().into_owned();

    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", display_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", display_name);
            Err(CoreError::DependencyNotFound(display_name))
        }
        Err(e) => {
            log::error!(
                "Failed to start dependency check command '{}': {}",
                display_name,
                e
            );
            Err(command_start_error(display_name, e))
        }
    }
}
