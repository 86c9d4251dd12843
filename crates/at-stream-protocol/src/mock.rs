//! In-memory transport for exercising sessions without hardware.
//!
//! [`MockTransport`] records every write and serves inbound bytes from a
//! queue. Bytes can be queued directly with [`push_inbound`](MockTransport::push_inbound)
//! or attached to an expected request with [`expect`](MockTransport::expect),
//! in which case they are queued only once that exact request is written.
//!
//! # Example
//!
//! ```
//! use at_stream_protocol::{AtSession, MockTransport, Outcome};
//!
//! let mut mock = MockTransport::new();
//! mock.expect(b"AT+VERSION\r\n", b"1.2.3\r\nOK\r\n");
//!
//! let mut session = AtSession::new(&mut mock);
//! session.execute("VERSION", &[]).unwrap();
//! session.wait_until_ready().unwrap();
//! assert_eq!(session.outcome(), Some(Outcome::Ok));
//! assert_eq!(session.response().as_deref(), Some("1.2.3\n"));
//! ```

use std::collections::VecDeque;
use std::io;

use crate::transport::Transport;

#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

/// A scripted [`Transport`] for tests.
#[derive(Debug, Default)]
pub struct MockTransport {
    inbound: VecDeque<u8>,
    expectations: VecDeque<Expectation>,
    written: Vec<Vec<u8>>,
    fail_writes: bool,
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the session to read.
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.extend(data);
    }

    /// Queue `response` once `request` is written.
    ///
    /// Expectations are matched in order against each write. A write that does
    /// not match the next expectation is recorded but triggers nothing.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Make subsequent writes fail with `BrokenPipe`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Every successful write, in order.
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.written.len()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.written.concat()
    }

    /// Inbound bytes not yet read.
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Expectations not yet matched.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }
}

impl Transport for MockTransport {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.inbound.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.inbound
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "mock inbound queue empty"))
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }

        self.written.push(data.to_vec());

        if self
            .expectations
            .front()
            .is_some_and(|expected| expected.request == data)
        {
            if let Some(expected) = self.expectations.pop_front() {
                self.inbound.extend(expected.response);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read() {
        let mut mock = MockTransport::new();
        mock.push_inbound(b"ab");
        assert_eq!(mock.available().unwrap(), 2);
        assert_eq!(mock.read_byte().unwrap(), b'a');
        assert_eq!(mock.read_byte().unwrap(), b'b');
        assert!(mock.read_byte().is_err());
    }

    #[test]
    fn test_expectation_queues_response_on_match() {
        let mut mock = MockTransport::new();
        mock.expect(b"AT+A\r\n", b"OK\r\n");

        mock.write_all(b"AT+B\r\n").unwrap();
        assert_eq!(mock.pending_inbound(), 0);
        assert_eq!(mock.remaining_expectations(), 1);

        mock.write_all(b"AT+A\r\n").unwrap();
        assert_eq!(mock.pending_inbound(), 4);
        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.write_count(), 2);
        assert_eq!(mock.written_bytes(), b"AT+B\r\nAT+A\r\n");
    }

    #[test]
    fn test_failed_write_not_recorded() {
        let mut mock = MockTransport::new();
        mock.set_fail_writes(true);
        assert!(mock.write_all(b"AT+X\r\n").is_err());
        assert_eq!(mock.write_count(), 0);
    }
}
