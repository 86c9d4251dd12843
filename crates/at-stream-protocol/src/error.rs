//! Error and outcome types for the AT protocol engine.

use thiserror::Error;

/// Identifies which bounded buffer ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// The line currently being assembled.
    Line,
    /// The accumulated response body.
    Response,
    /// The serialized outgoing command line.
    Command,
}

impl std::fmt::Display for BufferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferKind::Line => write!(f, "line"),
            BufferKind::Response => write!(f, "response"),
            BufferKind::Command => write!(f, "command"),
        }
    }
}

/// Errors that can occur while driving an AT session.
#[derive(Debug, Error)]
pub enum AtError {
    /// A command is already in flight.
    #[error("a command is already awaiting its response")]
    Busy,

    /// A bounded buffer (or an allocation for one) could not hold the data.
    #[error("{buffer} buffer overflow: limit {limit} bytes")]
    AllocationFailure {
        /// The buffer that overflowed.
        buffer: BufferKind,
        /// Its capacity, or the size of the failed allocation.
        limit: usize,
    },

    /// The command name cannot be put on the wire.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// A response field could not be classified as string, null or integer.
    #[error("malformed argument at index {index}: {text:?}")]
    MalformedArgument {
        /// Zero-based field position.
        index: usize,
        /// The offending field text.
        text: String,
    },

    /// No terminal status line arrived before the deadline.
    #[error("timeout waiting for response")]
    Timeout,

    /// The underlying byte transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Session configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AtError {
    /// The [`Outcome`] this error is reported as, if it corresponds to one.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            AtError::Busy => Some(Outcome::Busy),
            AtError::AllocationFailure { .. } => Some(Outcome::AllocationFailure),
            AtError::MalformedCommand(_) | AtError::MalformedArgument { .. } => {
                Some(Outcome::MalformedCommand)
            }
            AtError::Timeout | AtError::Transport(_) | AtError::InvalidConfig(_) => None,
        }
    }
}

/// Result type alias for AT operations.
pub type AtResult<T> = Result<T, AtError>;

/// Outcome of a completed or rejected exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The peer answered `OK`.
    Ok,
    /// The peer answered `ERROR`.
    ErrorStatus,
    /// The peer answered `FAIL`.
    Fail,
    /// The command was rejected because another was in flight.
    Busy,
    /// A buffer overflowed while sending or receiving.
    AllocationFailure,
    /// The command or its arguments were malformed.
    MalformedCommand,
}

impl Outcome {
    /// Classify a completed line (without `\r`/`\n`) as a terminal status.
    ///
    /// Matching is exact and case-sensitive.
    pub fn from_terminal_line(line: &[u8]) -> Option<Outcome> {
        match line {
            b"OK" => Some(Outcome::Ok),
            b"ERROR" => Some(Outcome::ErrorStatus),
            b"FAIL" => Some(Outcome::Fail),
            _ => None,
        }
    }

    /// True only for an `OK` exchange.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    /// True for outcomes reported by the peer rather than the engine.
    pub fn is_peer_status(&self) -> bool {
        matches!(self, Outcome::Ok | Outcome::ErrorStatus | Outcome::Fail)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Ok => write!(f, "OK"),
            Outcome::ErrorStatus => write!(f, "ERROR"),
            Outcome::Fail => write!(f, "FAIL"),
            Outcome::Busy => write!(f, "busy"),
            Outcome::AllocationFailure => write!(f, "allocation failure"),
            Outcome::MalformedCommand => write!(f, "malformed command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_tokens() {
        assert_eq!(Outcome::from_terminal_line(b"OK"), Some(Outcome::Ok));
        assert_eq!(Outcome::from_terminal_line(b"ERROR"), Some(Outcome::ErrorStatus));
        assert_eq!(Outcome::from_terminal_line(b"FAIL"), Some(Outcome::Fail));
    }

    #[test]
    fn test_terminal_tokens_are_exact() {
        assert_eq!(Outcome::from_terminal_line(b"ok"), None);
        assert_eq!(Outcome::from_terminal_line(b" OK"), None);
        assert_eq!(Outcome::from_terminal_line(b"BOOK"), None);
        assert_eq!(Outcome::from_terminal_line(b"ERRORS"), None);
        assert_eq!(Outcome::from_terminal_line(b""), None);
    }

    #[test]
    fn test_error_outcome_mapping() {
        assert_eq!(AtError::Busy.outcome(), Some(Outcome::Busy));
        assert_eq!(
            AtError::AllocationFailure { buffer: BufferKind::Line, limit: 64 }.outcome(),
            Some(Outcome::AllocationFailure)
        );
        assert_eq!(
            AtError::MalformedArgument { index: 0, text: "x".into() }.outcome(),
            Some(Outcome::MalformedCommand)
        );
        assert_eq!(AtError::Timeout.outcome(), None);
    }

    #[test]
    fn test_error_display() {
        let err = AtError::AllocationFailure { buffer: BufferKind::Response, limit: 256 };
        assert_eq!(err.to_string(), "response buffer overflow: limit 256 bytes");
    }
}
