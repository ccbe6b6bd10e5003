//! Message writer
//!
//! Serializes messages onto a byte stream.

use std::io::Write;

use super::{write_message, Message};
use crate::error::Result;

/// Writes framed messages to an underlying stream, flushing after each one
#[derive(Debug)]
pub struct MessageWriter<W: Write> {
    writer: W,
}

impl<W: Write> MessageWriter<W> {
    /// Wrap a stream
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encode, write and flush one message
    ///
    /// Returns the number of bytes written. I/O failures are surfaced as-is;
    /// nothing is retried.
    pub fn write_message(&mut self, message: &Message) -> Result<usize> {
        let written = write_message(&mut self.writer, message)?;
        tracing::trace!("Wrote {} ({} bytes)", message, written);
        Ok(written)
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the underlying stream
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> W {
        self.writer
    }
}
