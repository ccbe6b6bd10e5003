//! TCP Client
//!
//! One connection, strict request/response turn-taking.

use std::io::BufReader;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{MtpError, Result};
use crate::protocol::{read_message, Message, MessageWriter};

/// A client connection to an MTP server
///
/// There is no request correlation: send one message, read its reply, then
/// send the next. Pipelining is not supported.
pub struct Client {
    /// Kept across calls so buffered bytes are never dropped
    reader: BufReader<TcpStream>,
    writer: MessageWriter<TcpStream>,
    peer_addr: SocketAddr,
}

impl Client {
    /// Connect to a server
    ///
    /// `:port` means the local host. No retry, no timeout beyond the OS
    /// connect timeout.
    pub fn dial(addr: &str) -> Result<Self> {
        let addr = match addr.strip_prefix(':') {
            Some(port) => format!("127.0.0.1:{}", port),
            None => addr.to_string(),
        };

        let stream = TcpStream::connect(&addr)?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        let read_stream = stream.try_clone()?;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: MessageWriter::new(stream),
            peer_addr,
        })
    }

    /// Encode and send one message
    pub fn send_message(&mut self, message: &Message) -> Result<()> {
        self.writer.write_message(message)?;
        Ok(())
    }

    /// Block until one message arrives
    ///
    /// Fails with [`MtpError::ConnectionClosed`] if the server closed the
    /// connection between frames.
    pub fn receive_message(&mut self) -> Result<Message> {
        read_message(&mut self.reader)?.ok_or(MtpError::ConnectionClosed)
    }

    /// Send a message and wait for its reply
    pub fn request(&mut self, message: &Message) -> Result<Message> {
        self.send_message(message)?;
        self.receive_message()
    }

    /// Bound how long `receive_message` may block (`None` = forever)
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Address of the server
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Close the connection
    pub fn close(self) -> Result<()> {
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already gone
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
