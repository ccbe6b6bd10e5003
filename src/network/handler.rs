//! Handler contract and opcode dispatch
//!
//! The server hands every decoded message to a [`Handler`]. It never looks at
//! the opcode itself; [`Router`] is the standard way to map opcodes onto
//! handler functions.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use crate::error::{MtpError, Result};
use crate::protocol::{validate_payload, Message, MessageWriter, KIND_ERROR};

/// Application logic invoked once per decoded message
///
/// Implementations may reply through `writer` zero or one time before
/// returning. Handlers run on the connection's own thread and must bring
/// their own synchronization for any shared state.
pub trait Handler: Send + Sync {
    fn serve(&self, writer: &mut ResponseWriter<'_>, message: &Message);
}

impl<F> Handler for F
where
    F: Fn(&mut ResponseWriter<'_>, &Message) + Send + Sync,
{
    fn serve(&self, writer: &mut ResponseWriter<'_>, message: &Message) {
        self(writer, message)
    }
}

// =============================================================================
// ResponseWriter
// =============================================================================

/// Writer passed to handlers; accepts at most one reply per request
pub struct ResponseWriter<'a> {
    writer: MessageWriter<&'a mut dyn Write>,
    replied: bool,
    failed: bool,
}

impl<'a> ResponseWriter<'a> {
    /// Wrap the connection's write half
    pub fn new(stream: &'a mut dyn Write) -> Self {
        Self {
            writer: MessageWriter::new(stream),
            replied: false,
            failed: false,
        }
    }

    /// Send the reply
    ///
    /// A second call fails with [`MtpError::ReplyAlreadySent`]. A message the
    /// encoder rejects never reaches the stream and does not count as the
    /// reply, so the handler can still answer with an error.
    pub fn write_message(&mut self, message: &Message) -> Result<usize> {
        if self.replied {
            return Err(MtpError::ReplyAlreadySent);
        }
        validate_payload(&message.payload)?;
        self.replied = true;

        self.writer.write_message(message).map_err(|e| {
            if matches!(e, MtpError::Io(_)) {
                self.failed = true;
            }
            e
        })
    }

    /// Reply with an `Error` message carrying `err`'s text
    pub fn write_error(&mut self, err: impl fmt::Display) -> Result<usize> {
        self.write_message(&Message::new(KIND_ERROR, single_line(&err.to_string())))
    }

    /// True once a reply has been attempted
    pub fn has_replied(&self) -> bool {
        self.replied
    }

    /// True if writing the reply hit an I/O error
    ///
    /// The stream may hold a partial frame at that point, so the server
    /// closes the connection.
    pub fn is_broken(&self) -> bool {
        self.failed
    }
}

/// Error texts go on a single line
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ")
}

// =============================================================================
// Router
// =============================================================================

/// Dispatch map from opcode to handler
///
/// Messages whose opcode has no route go to the fallback, which by default
/// replies with an `Error` message naming the unknown type.
pub struct Router {
    routes: HashMap<u64, Box<dyn Handler>>,
    fallback: Box<dyn Handler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router with no routes and the default fallback
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: Box::new(unknown_message),
        }
    }

    /// Register a handler for an opcode, replacing any previous one
    pub fn route(mut self, kind: u64, handler: impl Handler + 'static) -> Self {
        self.routes.insert(kind, Box::new(handler));
        self
    }

    /// Register a closure for an opcode
    pub fn route_fn<F>(self, kind: u64, handler: F) -> Self
    where
        F: Fn(&mut ResponseWriter<'_>, &Message) + Send + Sync + 'static,
    {
        self.route(kind, handler)
    }

    /// Replace the handler used for unrouted opcodes
    pub fn fallback(mut self, handler: impl Handler + 'static) -> Self {
        self.fallback = Box::new(handler);
        self
    }

    /// True if `kind` has a dedicated handler
    pub fn has_route(&self, kind: u64) -> bool {
        self.routes.contains_key(&kind)
    }
}

impl Handler for Router {
    fn serve(&self, writer: &mut ResponseWriter<'_>, message: &Message) {
        match self.routes.get(&message.kind) {
            Some(handler) => handler.serve(writer, message),
            None => self.fallback.serve(writer, message),
        }
    }
}

fn unknown_message(writer: &mut ResponseWriter<'_>, message: &Message) {
    tracing::warn!("No handler for message type {}", message.kind);
    if let Err(e) = writer.write_error(format!("unknown message type: {}", message.kind)) {
        tracing::warn!("Failed to send error reply: {}", e);
    }
}
