//! # Line Framer
//!
//! Accumulates raw serial bytes and hands out complete text lines.

use bytes::{Buf, BytesMut};

/// Longest partial line kept while waiting for a newline
pub const MAX_PENDING_BYTES: usize = 4096;

/// Splits a byte stream into `\n`-terminated lines
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes
    ///
    /// If the pending partial line grows past [`MAX_PENDING_BYTES`] without a
    /// newline it is discarded; a sensor that never terminates its lines would
    /// otherwise grow the buffer forever.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        if self.buffer.len() > MAX_PENDING_BYTES && !self.buffer.contains(&b'\n') {
            self.buffer.clear();
        }
    }

    /// Take the next complete line, trimmed, if one is buffered
    ///
    /// Invalid UTF-8 is replaced rather than rejected so a single corrupted
    /// byte costs one record, not the connection.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line = self.buffer.split_to(end);
        self.buffer.advance(1);
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    /// Bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
