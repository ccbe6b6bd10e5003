//! # MTP
//!
//! Message Transfer Protocol: a minimal request/response protocol over TCP,
//! with a small product catalog running on top of it.
//! - Two-line CRLF text framing (type line + payload line)
//! - Thread-per-connection server with idle timeouts
//! - Graceful shutdown that drains open connections
//! - Opcode dispatch through an injected handler
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   frames    ┌─────────────────────────────────────┐
//! │    Client    │────────────▶│              Server                 │
//! │ (one stream) │◀────────────│  accept loop ─▶ registry            │
//! └──────────────┘             │      │                              │
//!                              │      ▼                              │
//!                              │  connection thread (IdleConn)       │
//!                              │   decode ─▶ Handler ─▶ reply        │
//!                              └──────────────────┬──────────────────┘
//!                                                 │
//!                                          ┌──────▼──────┐
//!                                          │   Router    │
//!                                          │ (opcode map)│
//!                                          └──────┬──────┘
//!                                                 │
//!                                          ┌──────▼──────┐
//!                                          │   Market    │
//!                                          │ (catalog)   │
//!                                          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod market;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MtpError, Result};
pub use config::ServerConfig;
pub use network::{Client, Handler, ResponseWriter, Router, Server};
pub use protocol::Message;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of MTP
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
