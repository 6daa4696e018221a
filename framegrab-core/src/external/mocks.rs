// framegrab-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests only.

use super::{FfmpegProcess, FfmpegSpawner, command_args};
use crate::error::{CoreResult, command_start_error};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Mutex;

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Vec<FfmpegEvent>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events_to_emit.clone() {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// What the mock does when a command is spawned.
#[derive(Clone)]
enum MockBehaviour {
    /// Exit 0; copy the `-i` input file to the last argument.
    CopyInputToOutput,
    /// Exit with `code` after emitting `events`.
    Exit { code: i32, events: Vec<FfmpegEvent> },
    /// Fail to start, as if the binary were missing.
    SpawnError,
}

/// Mock implementation of FfmpegSpawner that records every command line.
pub struct MockFfmpegSpawner {
    behaviour: MockBehaviour,
    received_calls: Mutex<Vec<Vec<String>>>,
}

impl MockFfmpegSpawner {
    fn with_behaviour(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            received_calls: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds and writes the input file unchanged to the output path.
    pub fn copying() -> Self {
        Self::with_behaviour(MockBehaviour::CopyInputToOutput)
    }

    /// Runs and exits with `code`, logging `stderr` as an error line.
    pub fn exiting_with(code: i32, stderr: &str) -> Self {
        Self::with_behaviour(MockBehaviour::Exit {
            code,
            events: vec![FfmpegEvent::Error(stderr.to_string())],
        })
    }

    /// Exits 0 after emitting `events`, e.g. decoded output frames.
    pub fn emitting(events: Vec<FfmpegEvent>) -> Self {
        Self::with_behaviour(MockBehaviour::Exit { code: 0, events })
    }

    /// Fails to spawn.
    pub fn missing_binary() -> Self {
        Self::with_behaviour(MockBehaviour::SpawnError)
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args = command_args(&mut cmd);
        if let Ok(mut calls) = self.received_calls.lock() {
            calls.push(args.clone());
        }

        match &self.behaviour {
            MockBehaviour::CopyInputToOutput => {
                let input = args
                    .iter()
                    .position(|arg| arg == "-i")
                    .and_then(|i| args.get(i + 1))
                    .map(PathBuf::from);
                let output = args.last().map(PathBuf::from);
                if let (Some(input), Some(output)) = (input, output) {
                    std::fs::copy(&input, &output)?;
                }
                Ok(MockFfmpegProcess {
                    events_to_emit: Vec::new(),
                    exit_status: ExitStatus::from_raw(0),
                })
            }
            MockBehaviour::Exit { code, events } => Ok(MockFfmpegProcess {
                events_to_emit: events.clone(),
                exit_status: ExitStatus::from_raw(code << 8),
            }),
            MockBehaviour::SpawnError => Err(command_start_error(
                "ffmpeg (mock)",
                std::io::Error::new(std::io::ErrorKind::NotFound, "mock binary missing"),
            )),
        }
    }
}
