//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! <decimal-type>\r\n
//! <payload>\r\n
//! ```
//!
//! Lines end with exactly CRLF. A bare `\n` inside the payload is just
//! another payload byte, which is why lines are reassembled until the
//! accumulated bytes end in `\r\n`, however many reads that takes.

use std::io::{BufRead, Cursor, Read, Write};

use super::Message;
use crate::error::{MtpError, Result};

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Maximum length of a single line, terminator excluded (16 MB)
pub const MAX_LINE_LEN: usize = 16 * 1024 * 1024;

/// Maximum length of the type line, terminator excluded
///
/// `u64::MAX` has 20 digits; the rest leaves room for leading zeros.
pub const MAX_TYPE_LINE_LEN: usize = 32;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a message to bytes
///
/// Fails with [`MtpError::InvalidPayload`] if the payload contains CRLF,
/// since such a frame could not be decoded back.
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    validate_payload(&message.payload)?;

    let kind = message.kind.to_string();
    let mut frame = Vec::with_capacity(kind.len() + message.payload.len() + 2 * CRLF.len());
    frame.extend_from_slice(kind.as_bytes());
    frame.extend_from_slice(CRLF);
    frame.extend_from_slice(message.payload.as_bytes());
    frame.extend_from_slice(CRLF);

    Ok(frame)
}

/// Check that a payload can be carried in a single line
pub fn validate_payload(payload: &str) -> Result<()> {
    if payload.contains("\r\n") {
        return Err(MtpError::InvalidPayload(
            "payload must not contain CRLF".to_string(),
        ));
    }
    if payload.len() > MAX_LINE_LEN {
        return Err(MtpError::FrameTooLarge { limit: MAX_LINE_LEN });
    }
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one message from the front of a byte slice
///
/// Returns the message and the number of bytes it occupied. Anything after
/// that is left for the next call.
pub fn decode_message(bytes: &[u8]) -> Result<(Message, usize)> {
    let mut cursor = Cursor::new(bytes);
    match read_message(&mut cursor)? {
        Some(message) => Ok((message, cursor.position() as usize)),
        None => Err(MtpError::IncompleteFrame),
    }
}

/// Outcome of reading a single line
enum Line {
    /// A full line, terminator stripped
    Complete(Vec<u8>),
    /// Stream ended after some bytes but before CRLF
    Partial,
    /// Stream ended before any byte
    Eof,
}

/// Read one CRLF-terminated line of at most `limit` bytes
fn read_line<R: BufRead>(reader: &mut R, limit: usize) -> Result<Line> {
    let mut line = Vec::new();

    loop {
        let budget = (limit + CRLF.len()).saturating_sub(line.len()) as u64;
        let n = reader.by_ref().take(budget).read_until(b'\n', &mut line)?;

        if line.ends_with(CRLF) {
            line.truncate(line.len() - CRLF.len());
            return Ok(Line::Complete(line));
        }
        if line.len() >= limit + CRLF.len() {
            return Err(MtpError::FrameTooLarge { limit });
        }
        if n == 0 || !line.ends_with(b"\n") {
            // read_until only stops short of the delimiter at end of stream
            return Ok(if line.is_empty() { Line::Eof } else { Line::Partial });
        }
        // bare '\n' inside the line, keep going
    }
}

/// Parse the type line: ASCII digits only
fn parse_kind(line: &[u8]) -> Result<u64> {
    if line.is_empty() || !line.iter().all(u8::is_ascii_digit) {
        return Err(MtpError::MalformedFrame(format!(
            "bad message type: {:?}",
            String::from_utf8_lossy(line)
        )));
    }

    // Digits only, so this is valid UTF-8
    let text = std::str::from_utf8(line)
        .map_err(|e| MtpError::MalformedFrame(format!("bad message type: {}", e)))?;
    text.parse::<u64>()
        .map_err(|e| MtpError::MalformedFrame(format!("bad message type {:?}: {}", text, e)))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete message from a buffered stream
///
/// - `Ok(Some(msg))`: a full frame was read; the reader sits right after it
/// - `Ok(None)`: the stream ended cleanly between frames
/// - `Err(IncompleteFrame)`: the stream ended in the middle of a frame
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<Message>> {
    let kind_line = match read_line(reader, MAX_TYPE_LINE_LEN)? {
        Line::Complete(line) => line,
        Line::Partial => return Err(MtpError::IncompleteFrame),
        Line::Eof => return Ok(None),
    };
    let kind = parse_kind(&kind_line)?;

    let payload = match read_line(reader, MAX_LINE_LEN)? {
        Line::Complete(line) => line,
        Line::Partial | Line::Eof => return Err(MtpError::IncompleteFrame),
    };
    let payload = String::from_utf8(payload)
        .map_err(|_| MtpError::MalformedFrame("payload is not valid UTF-8".to_string()))?;

    Ok(Some(Message { kind, payload }))
}

/// Write a message to a stream and flush it
///
/// Returns the number of bytes written.
pub fn write_message<W: Write + ?Sized>(writer: &mut W, message: &Message) -> Result<usize> {
    let bytes = encode_message(message)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len())
}
