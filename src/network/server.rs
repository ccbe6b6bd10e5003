//! TCP Server
//!
//! Accepts connections and runs one handling thread per connection.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::config::ServerConfig;
use crate::error::{MtpError, Result};

use super::{Connection, ConnectionRegistry, Handler, IdleConn};

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Bound on the loopback connect that wakes a blocked `accept`
const WAKE_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// How long shutdown waits for the acceptor before waking it again
const WAKE_RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Extra time given to force-closed connections to deregister
const FORCED_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle of a server instance
///
/// `Created → Listening → ShuttingDown → Stopped`. There is no way back:
/// a stopped server cannot be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Listening,
    ShuttingDown,
    Stopped,
}

struct Lifecycle {
    state: ServerState,
    local_addr: Option<SocketAddr>,
    listener_open: bool,
}

/// TCP server for MTP
///
/// All methods take `&self`; share the server through an `Arc` so one
/// thread can run [`Server::listen_and_serve`] while another calls
/// [`Server::shutdown`].
pub struct Server {
    config: ServerConfig,
    handler: Arc<dyn Handler>,
    registry: Arc<ConnectionRegistry>,
    lifecycle: Mutex<Lifecycle>,
    lifecycle_changed: Condvar,
    in_shutdown: AtomicBool,
}

impl Server {
    /// Create a new server with the given config and handler
    pub fn new(config: ServerConfig, handler: impl Handler + 'static) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            registry: Arc::new(ConnectionRegistry::new()),
            lifecycle: Mutex::new(Lifecycle {
                state: ServerState::Created,
                local_addr: None,
                listener_open: false,
            }),
            lifecycle_changed: Condvar::new(),
            in_shutdown: AtomicBool::new(false),
        }
    }

    /// Bind the configured address and serve until shutdown completes
    ///
    /// A bind failure is returned immediately.
    pub fn listen_and_serve(&self) -> Result<()> {
        self.config.validate()?;

        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr).map_err(|e| {
            tracing::error!("Failed to bind {}: {}", addr, e);
            e
        })?;

        self.serve(listener)
    }

    /// Accept connections on `listener` until shutdown completes
    ///
    /// Returns once [`Server::shutdown`] has finished draining.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        self.config.validate()?;
        let local_addr = listener.local_addr()?;

        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != ServerState::Created {
                return Err(MtpError::ServerClosed);
            }
            lifecycle.state = ServerState::Listening;
            lifecycle.local_addr = Some(local_addr);
            lifecycle.listener_open = true;
        }
        self.lifecycle_changed.notify_all();
        tracing::info!("Listening on {}", local_addr);

        let result = self.accept_loop(&listener);

        drop(listener);
        self.lifecycle.lock().listener_open = false;
        self.lifecycle_changed.notify_all();
        tracing::debug!("Listener on {} closed", local_addr);

        result?;

        let mut lifecycle = self.lifecycle.lock();
        while lifecycle.state != ServerState::Stopped {
            self.lifecycle_changed.wait(&mut lifecycle);
        }
        Ok(())
    }

    /// Blocking accept loop
    ///
    /// `shutdown` sets `in_shutdown` and then connects to the listener, so
    /// the pending `accept` returns and the flag is seen straight away.
    fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        listener.set_nonblocking(false)?;

        while !self.in_shutdown.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if self.in_shutdown.load(Ordering::Acquire) {
                        tracing::debug!("Refusing {} during shutdown", peer);
                        break;
                    }
                    if let Err(e) = self.spawn_connection(stream, peer) {
                        tracing::warn!("Failed to start handler for {}: {}", peer, e);
                    }
                }
                Err(e) => {
                    if self.in_shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    tracing::warn!("Error accepting connection: {}", e);
                    thread::sleep(ACCEPT_ERROR_BACKOFF);
                }
            }
        }

        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        let conn = IdleConn::new(stream, self.config.idle_timeout)?;
        let guard = self.registry.register(conn.stream())?;
        let handler = Arc::clone(&self.handler);

        tracing::info!("Connection accepted: {}", peer);

        thread::Builder::new()
            .name(format!("mtp-conn-{}", guard.id()))
            .spawn(move || {
                let result = Connection::new(conn, handler).and_then(|mut c| c.handle());
                if let Err(e) = result {
                    tracing::debug!("Connection {} ended with error: {}", peer, e);
                }
                // Deregister only after the sockets are closed
                drop(guard);
                tracing::info!("Connection closed: {}", peer);
            })?;

        Ok(())
    }

    /// Stop accepting and wait for open connections to finish
    ///
    /// Closes the listener right away, then blocks until every connection
    /// has ended on its own (peer close or idle timeout). With a
    /// `shutdown_timeout` configured, connections still open at the deadline
    /// are force-closed.
    ///
    /// Fails with [`MtpError::NotListening`] if the server never started.
    /// Calling it again after the server stopped is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.state {
                ServerState::Created => return Err(MtpError::NotListening),
                ServerState::Stopped => return Ok(()),
                ServerState::ShuttingDown => {
                    while lifecycle.state != ServerState::Stopped {
                        self.lifecycle_changed.wait(&mut lifecycle);
                    }
                    return Ok(());
                }
                ServerState::Listening => {}
            }

            tracing::info!("Shutting down...");
            lifecycle.state = ServerState::ShuttingDown;
            self.in_shutdown.store(true, Ordering::Release);
            self.lifecycle_changed.notify_all();

            // Retried in case the wake-up connect raced the acceptor
            while lifecycle.listener_open {
                if let Some(addr) = lifecycle.local_addr {
                    MutexGuard::unlocked(&mut lifecycle, || wake_acceptor(addr));
                }
                if lifecycle.listener_open {
                    self.lifecycle_changed
                        .wait_for(&mut lifecycle, WAKE_RETRY_INTERVAL);
                }
            }
        }

        let result = self.drain();

        self.lifecycle.lock().state = ServerState::Stopped;
        self.lifecycle_changed.notify_all();
        tracing::info!("Server stopped");

        result
    }

    /// Block until the server has left `Created`, or `timeout` passes
    ///
    /// Returns the state seen last. Lets a caller that raced `serve` (a
    /// signal arriving during startup) retry `shutdown` once listening.
    pub fn wait_started(&self, timeout: Duration) -> ServerState {
        let deadline = Instant::now() + timeout;
        let mut lifecycle = self.lifecycle.lock();
        while lifecycle.state == ServerState::Created {
            if self
                .lifecycle_changed
                .wait_until(&mut lifecycle, deadline)
                .timed_out()
            {
                break;
            }
        }
        lifecycle.state
    }

    fn drain(&self) -> Result<()> {
        let open = self.registry.len();
        if open > 0 {
            tracing::info!("Waiting for {} connection(s) to disconnect", open);
        }

        if self.registry.wait_until_empty(self.config.shutdown_timeout) {
            return Ok(());
        }

        tracing::warn!(
            "Shutdown deadline exceeded with {} connection(s) open, forcing close",
            self.registry.len()
        );
        self.registry.close_all();

        if self.registry.wait_until_empty(Some(FORCED_CLOSE_GRACE)) {
            Ok(())
        } else {
            Err(MtpError::ShutdownTimeout {
                remaining: self.registry.len(),
            })
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current lifecycle state
    pub fn state(&self) -> ServerState {
        self.lifecycle.lock().state
    }

    /// Address the listener is bound to, once serving
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.lock().local_addr
    }

    /// Number of connections currently being handled
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Connect to the listener so a blocked `accept` returns
///
/// A wildcard bind address is reached through loopback.
fn wake_acceptor(addr: SocketAddr) {
    let mut target = addr;
    if target.ip().is_unspecified() {
        target.set_ip(match addr {
            SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
            SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
        });
    }

    if let Err(e) = TcpStream::connect_timeout(&target, WAKE_CONNECT_TIMEOUT) {
        tracing::debug!("Waking acceptor on {} failed: {}", target, e);
    }
}
