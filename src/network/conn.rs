//! Idle-timeout stream wrapper
//!
//! Every accepted connection is wrapped in an [`IdleConn`] before the server
//! touches it.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::{is_timeout_kind, Result};

/// A TCP stream that fails any read or write after `idle_timeout` of silence
///
/// Socket timeouts apply per call, so each read and each write starts a
/// fresh idle window: the deadline rolls forward with every bit of activity.
/// A call that sees nothing for the whole window fails with
/// [`io::ErrorKind::TimedOut`] on every platform.
#[derive(Debug)]
pub struct IdleConn {
    stream: TcpStream,
    idle_timeout: Duration,
}

impl IdleConn {
    /// Wrap a stream and arm its idle timeout
    pub fn new(stream: TcpStream, idle_timeout: Duration) -> Result<Self> {
        // Disable Nagle's algorithm: frames are small and turn-based
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(idle_timeout))?;
        stream.set_write_timeout(Some(idle_timeout))?;

        Ok(Self {
            stream,
            idle_timeout,
        })
    }

    /// Second handle onto the same socket (shares the timeouts)
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            stream: self.stream.try_clone()?,
            idle_timeout: self.idle_timeout,
        })
    }

    /// The configured idle timeout
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// The raw stream underneath
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Close both directions of the socket
    pub fn shutdown(&self) -> io::Result<()> {
        self.stream.shutdown(Shutdown::Both)
    }
}

/// Map the platform-specific timeout kind onto `TimedOut`
fn deadline_exceeded(err: io::Error) -> io::Error {
    if is_timeout_kind(err.kind()) {
        io::Error::new(io::ErrorKind::TimedOut, "idle deadline exceeded")
    } else {
        err
    }
}

impl Read for IdleConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).map_err(deadline_exceeded)
    }
}

impl Write for IdleConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf).map_err(deadline_exceeded)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().map_err(deadline_exceeded)
    }
}
