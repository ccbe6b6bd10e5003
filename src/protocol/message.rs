//! Message definitions
//!
//! The unit exchanged between client and server.

use std::fmt;

/// Reserved type: never a valid request
pub const KIND_INVALID: u64 = 0;

/// Reserved type: payload is a human-readable error message
pub const KIND_ERROR: u64 = 1;

/// A single protocol message
///
/// `kind` selects how the payload is interpreted; the payload itself is an
/// opaque string as far as the transport is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message {
    /// Opcode (the `type` line on the wire)
    pub kind: u64,

    /// Payload line, never containing CRLF
    pub payload: String,
}

impl Message {
    /// Create a message with a payload
    pub fn new(kind: u64, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create a message with an empty payload
    pub fn empty(kind: u64) -> Self {
        Self {
            kind,
            payload: String::new(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message{{ Type: {}, Payload: {} }}", self.kind, self.payload)
    }
}
