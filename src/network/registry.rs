//! Connection Registry
//!
//! Bookkeeping of live connections, used by shutdown to know when the
//! server has drained.

use std::collections::HashMap;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::Result;

/// How often `wait_until_empty` reports the outstanding count
pub const SHUTDOWN_LOG_INTERVAL: Duration = Duration::from_millis(500);

/// Identifier handed out per registered connection
pub type ConnectionId = u64;

/// Set of currently open connections
///
/// ## Concurrency:
/// - One mutex guards every insert, remove and size check
/// - `drained` is signalled when the set becomes empty
/// - All methods use `&self`
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
    drained: Condvar,
}

#[derive(Default)]
struct RegistryInner {
    next_id: ConnectionId,
    conns: HashMap<ConnectionId, TrackedConn>,
}

struct TrackedConn {
    peer_addr: SocketAddr,
    /// Extra handle so shutdown can force the socket closed
    stream: TcpStream,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection
    ///
    /// The connection stays registered until the returned guard is dropped.
    pub fn register(self: &Arc<Self>, stream: &TcpStream) -> Result<ConnectionGuard> {
        let peer_addr = stream.peer_addr()?;
        let stream = stream.try_clone()?;

        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.conns.insert(id, TrackedConn { peer_addr, stream });

        Ok(ConnectionGuard {
            id,
            peer_addr,
            registry: Arc::clone(self),
        })
    }

    fn remove(&self, id: ConnectionId) {
        let mut inner = self.inner.lock();
        if inner.conns.remove(&id).is_some() && inner.conns.is_empty() {
            self.drained.notify_all();
        }
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.inner.lock().conns.len()
    }

    /// True when no connection is registered
    pub fn is_empty(&self) -> bool {
        self.inner.lock().conns.is_empty()
    }

    /// Block until the registry is empty
    ///
    /// Returns `false` if `timeout` elapsed first. `None` waits forever.
    pub fn wait_until_empty(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut inner = self.inner.lock();

        while !inner.conns.is_empty() {
            let step = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    (deadline - now).min(SHUTDOWN_LOG_INTERVAL)
                }
                None => SHUTDOWN_LOG_INTERVAL,
            };

            let result = self.drained.wait_for(&mut inner, step);
            if result.timed_out() && !inner.conns.is_empty() {
                tracing::info!(
                    "Waiting for {} connection(s) to disconnect",
                    inner.conns.len()
                );
            }
        }

        true
    }

    /// Force every registered socket closed
    ///
    /// Handling threads then fail their next read and deregister themselves.
    /// Returns how many sockets were shut down.
    pub fn close_all(&self) -> usize {
        let inner = self.inner.lock();
        for conn in inner.conns.values() {
            match conn.stream.shutdown(Shutdown::Both) {
                Ok(()) => tracing::debug!("Force-closed connection {}", conn.peer_addr),
                Err(e) => tracing::debug!("Closing {} failed: {}", conn.peer_addr, e),
            }
        }
        inner.conns.len()
    }

    /// Peer addresses of the live connections
    pub fn peers(&self) -> Vec<SocketAddr> {
        self.inner.lock().conns.values().map(|c| c.peer_addr).collect()
    }
}

/// Keeps a connection registered for as long as it lives
pub struct ConnectionGuard {
    id: ConnectionId,
    peer_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionGuard {
    /// Registry id of this connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address of this connection
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
