//! Connection Handler
//!
//! Handles individual client connections.

use std::io::BufReader;
use std::sync::Arc;

use crate::error::Result;
use crate::protocol::read_message;

use super::{Handler, IdleConn, ResponseWriter};

/// Handles a single client connection
pub struct Connection {
    /// Read half (buffered; owned per connection so decode state never mixes)
    reader: BufReader<IdleConn>,

    /// Write half
    writer: IdleConn,

    /// Application logic
    handler: Arc<dyn Handler>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(conn: IdleConn, handler: Arc<dyn Handler>) -> Result<Self> {
        let peer_addr = conn
            .stream()
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let writer = conn.try_clone()?;

        Ok(Self {
            reader: BufReader::new(conn),
            writer,
            handler,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one message at a time and hands it to the handler before
    /// reading the next. Returns `Ok(())` when the peer closes, goes idle for
    /// too long, or resets the connection; any other decode or I/O failure is
    /// returned as an error. Either way the caller closes the connection:
    /// after a bad frame there is no telling where the next one starts.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let message = match read_message(&mut self.reader) {
                Ok(Some(message)) => message,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_timeout() => {
                    tracing::info!(
                        "Deadline exceeded: {} idle for {:?}",
                        self.peer_addr,
                        self.writer.idle_timeout()
                    );
                    return Ok(());
                }
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Connection reset by client {}: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error parsing message from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received {} from {}", message, self.peer_addr);

            let mut writer = ResponseWriter::new(&mut self.writer);
            self.handler.serve(&mut writer, &message);

            if writer.is_broken() {
                tracing::debug!(
                    "Reply to {} failed, closing connection",
                    self.peer_addr
                );
                return Ok(());
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
