//! Console line framing
//!
//! The console link delivers bytes one at a time. [`LineFramer`] collects
//! them into [`Line`]s terminated by `\n` or `\r`.
//!
//! # Overflow
//!
//! The framer holds at most `capacity` bytes. Bytes arriving once the buffer
//! is full are discarded and reported as [`ProtocolError::FrameOverflow`];
//! the truncated content is kept and completed by the next terminator.
//! [`LineFramer::discarded`] counts the bytes lost from the line in progress
//! so callers can report an overflow once per line rather than per byte.

use std::fmt;

use crate::error::ProtocolError;

/// Default frame capacity in bytes (a 256-byte buffer less its terminator)
pub const DEFAULT_FRAME_CAPACITY: usize = 255;

/// A complete console line, without its terminator
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Line(Vec<u8>);

impl Line {
    /// Create a line from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw line bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the line and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Line length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the line is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for Line {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Line {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Streaming line framer for the console link
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    capacity: usize,
    discarded: usize,
}

impl LineFramer {
    /// Create a framer holding at most `capacity` bytes per line
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            discarded: 0,
        }
    }

    /// Configured frame capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes accumulated for the line in progress
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether the line in progress has been truncated
    pub fn is_truncated(&self) -> bool {
        self.discarded > 0
    }

    /// Bytes discarded from the line in progress
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Feed one console byte
    ///
    /// Returns the completed line on `\n` or `\r`. NUL bytes are line noise
    /// and are ignored without touching state.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, ProtocolError> {
        match byte {
            b'\n' | b'\r' => Ok(Some(self.take_line())),
            0 => Ok(None),
            _ if self.buffer.len() < self.capacity => {
                self.buffer.push(byte);
                Ok(None)
            }
            _ => {
                self.discarded += 1;
                Err(ProtocolError::FrameOverflow {
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Feed the result of a console poll
    ///
    /// `None` means no data was available; state is left untouched.
    pub fn poll(&mut self, byte: Option<u8>) -> Result<Option<Line>, ProtocolError> {
        match byte {
            Some(b) => self.feed(b),
            None => Ok(None),
        }
    }

    fn take_line(&mut self) -> Line {
        if self.discarded > 0 {
            tracing::debug!(
                "Completing truncated line: kept {} bytes, discarded {}",
                self.buffer.len(),
                self.discarded
            );
        }
        self.discarded = 0;
        let bytes = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.capacity));
        Line(bytes)
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_CAPACITY)
    }
}
