//! Error types for the command-line driver.

use at_stream_protocol::AtError;
use thiserror::Error;

/// Errors that stop the driver.
#[derive(Debug, Error)]
pub enum CliAppError {
    /// Protocol engine error.
    #[error("protocol error: {0}")]
    Protocol(#[from] AtError),

    /// I/O error connecting or reading the script.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The script file is not valid YAML for a [`Script`](crate::script::Script).
    #[error("invalid script: {0}")]
    Script(#[from] serde_yaml::Error),

    /// Neither a command nor a script was given.
    #[error("nothing to execute: pass a command or --script")]
    NoCommands,
}
