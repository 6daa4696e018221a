// ============================================================================
// framegrab-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and error context
//
// The CLI reports every failure as a framegrab-core `CoreError`. Failures in
// CLI-only steps (reading the config file) get a message naming the file.

// ---- Internal crate imports ----
use framegrab_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Prefixes an error with a lazily built message, as anyhow's `with_context`.
pub trait CliErrorContext<T> {
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}
