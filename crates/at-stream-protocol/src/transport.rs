//! Byte transport consumed by the session.
//!
//! The session needs only three things from the link: how many bytes can be
//! read without waiting, one byte at a time, and an in-order write. Any
//! framing, flow control or buffering below that is the transport's business.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// Size of a single read attempt in [`StreamTransport`].
const READ_CHUNK: usize = 256;

/// A byte-oriented serial link.
pub trait Transport {
    /// Number of bytes that [`read_byte`](Self::read_byte) can return without waiting.
    fn available(&mut self) -> io::Result<usize>;

    /// Read the next byte. Only called after `available()` reported data.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Write all of `data`, in order.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Adapts any `Read + Write` stream into a [`Transport`].
///
/// `available()` performs at most one read when its receive queue is empty.
/// For the session to stay non-blocking, the stream itself must not block on
/// reads (for example a `TcpStream` with `set_nonblocking(true)`). A read of
/// zero bytes means the peer closed the stream and is reported as
/// [`io::ErrorKind::UnexpectedEof`].
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    rx: VecDeque<u8>,
}

impl<S: Read + Write> StreamTransport<S> {
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        StreamTransport {
            stream,
            rx: VecDeque::with_capacity(READ_CHUNK),
        }
    }

    /// Get a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwrap the stream, dropping any bytes already read but not consumed.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream closed by peer",
                    ));
                }
                Ok(n) => {
                    self.rx.extend(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn available(&mut self) -> io::Result<usize> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.rx
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no byte available"))
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }
}
