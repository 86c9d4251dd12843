//! Byte-at-a-time line assembly and terminal status detection.
//!
//! Incoming bytes are split into lines on `\n`; `\r` is dropped wherever it
//! appears. A completed line that is exactly `OK`, `ERROR` or `FAIL` ends the
//! response. Any other line is appended to the response body followed by a
//! single `\n`. The terminal line itself is not part of the body.

use crate::buffer::BoundedBuffer;
use crate::error::{BufferKind, Outcome};

/// Where the assembler is within the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Accumulating bytes of a line.
    InLine,
    /// A line was just completed and is readable via [`LineAssembler::completed_line`].
    LineComplete,
}

/// Result of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The byte was consumed; no line completed.
    Pending,
    /// A non-terminal line completed.
    Line,
    /// A terminal status line completed the response.
    Complete(Outcome),
    /// A buffer overflowed. If a body was being captured it has been
    /// discarded and capture stopped; a finished body is left intact.
    Overflow(BufferKind),
}

/// Incremental line parser writing into bounded line and body buffers.
///
/// Body capture is switched on by [`begin_response`](Self::begin_response) and
/// off again by a terminal line or an overflow, so lines arriving outside an
/// exchange never disturb a finished response.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    line: BoundedBuffer,
    body: BoundedBuffer,
    state: AssemblerState,
    capturing: bool,
    // Set after a line overflow; the rest of that line is dropped.
    discarding: bool,
}

impl LineAssembler {
    /// Create an assembler with the given body and line capacities.
    pub fn new(max_response_len: usize, max_line_len: usize) -> Self {
        LineAssembler {
            line: BoundedBuffer::with_capacity(max_line_len),
            body: BoundedBuffer::with_capacity(max_response_len),
            state: AssemblerState::InLine,
            capturing: false,
            discarding: false,
        }
    }

    /// Clear both buffers and start capturing a new response body.
    pub fn begin_response(&mut self) {
        self.line.clear();
        self.body.clear();
        self.state = AssemblerState::InLine;
        self.capturing = true;
        self.discarding = false;
    }

    /// Stop capturing and drop the partial body.
    pub fn abort(&mut self) {
        self.capturing = false;
        self.body.clear();
    }

    /// Whether non-terminal lines are currently appended to the body.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Current line state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// The accumulated body.
    pub fn body(&self) -> &BoundedBuffer {
        &self.body
    }

    /// The line completed by the last byte fed.
    ///
    /// Stays readable until the next byte is fed. Empty while in
    /// [`AssemblerState::InLine`].
    pub fn completed_line(&self) -> &[u8] {
        match self.state {
            AssemblerState::LineComplete => self.line.as_bytes(),
            AssemblerState::InLine => &[],
        }
    }

    /// Consume one byte.
    pub fn feed(&mut self, byte: u8) -> Feed {
        if self.state == AssemblerState::LineComplete {
            self.line.clear();
            self.state = AssemblerState::InLine;
        }

        match byte {
            b'\r' => Feed::Pending,
            b'\n' => {
                if self.discarding {
                    self.discarding = false;
                    return Feed::Pending;
                }
                self.complete_line()
            }
            _ => {
                if self.discarding {
                    return Feed::Pending;
                }
                if self.line.push(byte).is_err() {
                    self.line.clear();
                    self.discarding = true;
                    return self.overflow(BufferKind::Line);
                }
                Feed::Pending
            }
        }
    }

    /// Feed a run of bytes, stopping at the first one that is not [`Feed::Pending`].
    ///
    /// Returns the number of bytes consumed and the result of the last one.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> (usize, Feed) {
        for (i, &byte) in bytes.iter().enumerate() {
            let feed = self.feed(byte);
            if feed != Feed::Pending {
                return (i + 1, feed);
            }
        }
        (bytes.len(), Feed::Pending)
    }

    fn complete_line(&mut self) -> Feed {
        self.state = AssemblerState::LineComplete;

        if let Some(outcome) = Outcome::from_terminal_line(self.line.as_bytes()) {
            self.capturing = false;
            return Feed::Complete(outcome);
        }

        if self.capturing {
            if self.body.remaining() < self.line.len() + 1 {
                return self.overflow(BufferKind::Response);
            }
            // Capacity was checked above; neither append can fail.
            let _ = self.body.extend_from_slice(self.line.as_bytes());
            let _ = self.body.push(b'\n');
        }

        Feed::Line
    }

    fn overflow(&mut self, buffer: BufferKind) -> Feed {
        if self.capturing {
            self.abort();
        }
        Feed::Overflow(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing(max_response_len: usize, max_line_len: usize) -> LineAssembler {
        let mut assembler = LineAssembler::new(max_response_len, max_line_len);
        assembler.begin_response();
        assembler
    }

    fn feed_all(assembler: &mut LineAssembler, bytes: &[u8]) -> Vec<Feed> {
        bytes
            .iter()
            .map(|&b| assembler.feed(b))
            .filter(|f| *f != Feed::Pending)
            .collect()
    }

    #[test]
    fn test_body_then_ok() {
        let mut assembler = capturing(256, 64);
        let feeds = feed_all(&mut assembler, b"some text\r\nOK\r\n");
        assert_eq!(feeds, vec![Feed::Line, Feed::Complete(Outcome::Ok)]);
        assert_eq!(assembler.body().as_bytes(), b"some text\n");
        assert!(!assembler.is_capturing());
    }

    #[test]
    fn test_error_and_fail_tokens() {
        let mut assembler = capturing(256, 64);
        assert_eq!(feed_all(&mut assembler, b"ERROR\n"), vec![Feed::Complete(Outcome::ErrorStatus)]);

        assembler.begin_response();
        assert_eq!(feed_all(&mut assembler, b"FAIL\r\n"), vec![Feed::Complete(Outcome::Fail)]);
    }

    #[test]
    fn test_substring_does_not_terminate() {
        let mut assembler = capturing(256, 64);
        assert_eq!(feed_all(&mut assembler, b"BOOK\r\n"), vec![Feed::Line]);
        assert!(assembler.is_capturing());
        assert_eq!(assembler.body().as_bytes(), b"BOOK\n");
    }

    #[test]
    fn test_no_detection_mid_line() {
        let mut assembler = capturing(256, 64);
        assert!(feed_all(&mut assembler, b"OK").is_empty());
        assert_eq!(feed_all(&mut assembler, b"AY\n"), vec![Feed::Line]);
        assert_eq!(assembler.body().as_bytes(), b"OKAY\n");
    }

    #[test]
    fn test_carriage_returns_stripped_anywhere() {
        let mut assembler = capturing(256, 64);
        feed_all(&mut assembler, b"a\rb\r\r\nO\rK\n");
        assert_eq!(assembler.body().as_bytes(), b"ab\n");
        assert!(!assembler.is_capturing());
    }

    #[test]
    fn test_empty_lines_kept_in_body() {
        let mut assembler = capturing(256, 64);
        feed_all(&mut assembler, b"\r\n\r\nOK\r\n");
        assert_eq!(assembler.body().as_bytes(), b"\n\n");
    }

    #[test]
    fn test_completed_line_readable_until_next_byte() {
        let mut assembler = capturing(256, 64);
        feed_all(&mut assembler, b"+CSQ: 23,99\n");
        assert_eq!(assembler.state(), AssemblerState::LineComplete);
        assert_eq!(assembler.completed_line(), b"+CSQ: 23,99");

        assembler.feed(b'x');
        assert_eq!(assembler.state(), AssemblerState::InLine);
        assert!(assembler.completed_line().is_empty());
    }

    #[test]
    fn test_body_overflow() {
        let mut assembler = capturing(8, 64);
        assert_eq!(feed_all(&mut assembler, b"1234\n"), vec![Feed::Line]);
        assert_eq!(
            feed_all(&mut assembler, b"5678\n"),
            vec![Feed::Overflow(BufferKind::Response)]
        );
        assert!(assembler.body().is_empty());
        assert!(assembler.body().len() <= assembler.body().capacity());
        assert!(!assembler.is_capturing());
    }

    #[test]
    fn test_body_exactly_full() {
        let mut assembler = capturing(5, 64);
        assert_eq!(feed_all(&mut assembler, b"1234\nOK\n"), vec![Feed::Line, Feed::Complete(Outcome::Ok)]);
        assert_eq!(assembler.body().as_bytes(), b"1234\n");
    }

    #[test]
    fn test_line_overflow_discards_rest_of_line() {
        let mut assembler = capturing(256, 4);
        assert_eq!(
            feed_all(&mut assembler, b"ABCDEOK\n"),
            vec![Feed::Overflow(BufferKind::Line)]
        );
        // The tail "OK" of the over-long line must not terminate anything.
        assert_eq!(assembler.state(), AssemblerState::InLine);
        assert_eq!(feed_all(&mut assembler, b"OK\n"), vec![Feed::Complete(Outcome::Ok)]);
    }

    #[test]
    fn test_lines_outside_capture_leave_body_alone() {
        let mut assembler = capturing(256, 64);
        feed_all(&mut assembler, b"first\nOK\n");
        assert_eq!(feed_all(&mut assembler, b"+RING\n"), vec![Feed::Line]);
        assert_eq!(assembler.completed_line(), b"+RING");
        assert_eq!(assembler.body().as_bytes(), b"first\n");
    }

    #[test]
    fn test_line_overflow_outside_capture_keeps_body() {
        let mut assembler = capturing(256, 8);
        feed_all(&mut assembler, b"first\nOK\n");
        assert_eq!(
            feed_all(&mut assembler, b"0123456789ABCDEF\r\n"),
            vec![Feed::Overflow(BufferKind::Line)]
        );
        assert_eq!(assembler.body().as_bytes(), b"first\n");
        assert!(!assembler.is_capturing());

        // The next short line is assembled normally.
        assert_eq!(feed_all(&mut assembler, b"+RING\n"), vec![Feed::Line]);
        assert_eq!(assembler.completed_line(), b"+RING");
    }

    #[test]
    fn test_feed_slice_stops_at_event() {
        let mut assembler = capturing(256, 64);
        let (consumed, feed) = assembler.feed_slice(b"ab\nOK\n");
        assert_eq!((consumed, feed), (3, Feed::Line));
        let (consumed, feed) = assembler.feed_slice(b"OK\n");
        assert_eq!((consumed, feed), (3, Feed::Complete(Outcome::Ok)));
        assert_eq!(assembler.feed_slice(b"tail"), (4, Feed::Pending));
    }
}
