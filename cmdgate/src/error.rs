//! Error type for CLI subcommands.

use cmdgate_core::ConfigError;

/// Exit code for success (and for a command the gate let through).
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration and I/O failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for a command the gate stopped.
pub const EXIT_STOPPED: i32 = 2;

/// Failures that end a CLI subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Socket or filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
