//! Network Tests
//!
//! Shared helpers for server and client tests.

mod client_tests;

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mtp::network::{Handler, ResponseWriter, Server, ServerState};
use mtp::protocol::Message;
use mtp::ServerConfig;

// =============================================================================
// Helper Functions
// =============================================================================

/// A server running on its own thread, bound to an ephemeral port
pub struct TestServer {
    pub server: Arc<Server>,
    pub addr: SocketAddr,
    thread: JoinHandle<mtp::Result<()>>,
}

impl TestServer {
    pub fn start(config: ServerConfig, handler: impl Handler + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Arc::new(Server::new(config, handler));
        let serving = Arc::clone(&server);
        let thread = thread::spawn(move || serving.serve(listener));

        assert!(wait_until(Duration::from_secs(5), || {
            server.state() == ServerState::Listening
        }));

        Self {
            server,
            addr,
            thread,
        }
    }

    /// Shut down and wait for the serving thread
    pub fn stop(self) -> mtp::Result<()> {
        let result = self.server.shutdown();
        self.thread.join().unwrap().unwrap();
        result
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    pub fn join(self) -> mtp::Result<()> {
        self.thread.join().unwrap()
    }
}

/// Config with short timeouts suited to tests
pub fn test_config() -> ServerConfig {
    ServerConfig::builder()
        .listen_addr("127.0.0.1:0")
        .idle_timeout(Duration::from_secs(30))
        .shutdown_timeout(None)
        .build()
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Replies with the request unchanged
pub fn echo(writer: &mut ResponseWriter<'_>, message: &Message) {
    let _ = writer.write_message(message);
}
