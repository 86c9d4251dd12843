//! Fixed-capacity byte buffer used for response lines and bodies.

use std::borrow::Cow;

use bytes::BytesMut;
use thiserror::Error;

/// An append was rejected because the buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer full: capacity {capacity} bytes")]
pub struct Overflow {
    /// Capacity of the buffer that rejected the append.
    pub capacity: usize,
}

/// An append-only byte buffer that never grows past its capacity.
///
/// Rejected appends leave the existing contents untouched.
#[derive(Debug, Clone)]
pub struct BoundedBuffer {
    data: BytesMut,
    capacity: usize,
}

impl BoundedBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        BoundedBuffer {
            data: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), Overflow> {
        if self.data.len() >= self.capacity {
            return Err(Overflow { capacity: self.capacity });
        }
        self.data.extend_from_slice(&[byte]);
        Ok(())
    }

    /// Append all of `bytes`, or nothing if they do not fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
        if bytes.len() > self.remaining() {
            return Err(Overflow { capacity: self.capacity });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Discard the contents.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maximum number of bytes this buffer accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// The raw contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The contents as text, replacing invalid UTF-8.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
