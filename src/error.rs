//! Error types for MTP
//!
//! Provides a unified error type for all operations.

use std::io;

use thiserror::Error;

/// Result type alias using MtpError
pub type Result<T> = std::result::Result<T, MtpError>;

/// Unified error type for MTP operations
#[derive(Debug, Error)]
pub enum MtpError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Incomplete frame: stream ended inside a frame")]
    IncompleteFrame,

    #[error("Frame line too large: exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown message type: {0}")]
    UnknownOpcode(u64),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("A reply has already been sent for this message")]
    ReplyAlreadySent,

    // -------------------------------------------------------------------------
    // Server Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Server is not listening")]
    NotListening,

    #[error("Server closed")]
    ServerClosed,

    #[error("Shutdown timed out with {remaining} connection(s) still open")]
    ShutdownTimeout { remaining: usize },

    // -------------------------------------------------------------------------
    // Application Errors
    // -------------------------------------------------------------------------
    #[error("Market error: {0}")]
    Market(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MtpError {
    /// True when the error is an expired idle/read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MtpError::Io(e) if is_timeout_kind(e.kind()))
    }

    /// True when the peer went away underneath us (reset, abort, broken pipe).
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            MtpError::Io(e) if matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        )
    }
}

/// Socket timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
pub(crate) fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
