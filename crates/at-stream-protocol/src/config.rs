//! Session capacity limits.

use crate::error::{AtError, AtResult};

/// Default maximum response body size in bytes.
pub const DEFAULT_MAX_RESPONSE_LEN: usize = 256;

/// Default maximum single line size in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 64;

/// Buffer limits for an [`AtSession`](crate::AtSession).
///
/// Exceeding either limit while a response is being received aborts the
/// exchange with [`Outcome::AllocationFailure`](crate::Outcome::AllocationFailure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Maximum bytes of accumulated response body, newlines included.
    pub max_response_len: usize,
    /// Maximum bytes in a single line, excluding `\r` and `\n`.
    pub max_line_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_response_len: DEFAULT_MAX_RESPONSE_LEN,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl SessionConfig {
    /// Set the maximum response body size.
    pub fn with_max_response_len(mut self, len: usize) -> Self {
        self.max_response_len = len;
        self
    }

    /// Set the maximum line size.
    pub fn with_max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }

    /// Reject limits that could never hold a terminal status line.
    pub fn validate(&self) -> AtResult<()> {
        // "ERROR" is the longest terminal token.
        if self.max_line_len < 5 {
            return Err(AtError::InvalidConfig(format!(
                "max_line_len must be at least 5, got {}",
                self.max_line_len
            )));
        }
        if self.max_response_len == 0 {
            return Err(AtError::InvalidConfig(
                "max_response_len must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
