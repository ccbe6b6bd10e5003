//! Configuration for the MTP server
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{MtpError, Result};

/// Address used when no listen address is configured
pub const DEFAULT_ADDR: &str = ":8080";

/// Main configuration for an MTP server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address. `:port` binds every interface, empty means
    /// [`DEFAULT_ADDR`].
    pub listen_addr: String,

    // -------------------------------------------------------------------------
    // Connection Lifecycle
    // -------------------------------------------------------------------------
    /// Maximum silence on a connection before it is closed.
    /// Applied to every accepted connection alike.
    pub idle_timeout: Duration,

    /// How long `shutdown` waits for connections to drain before it
    /// force-closes them. `None` waits forever.
    pub shutdown_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_ADDR.to_string(),
            idle_timeout: Duration::from_secs(30),
            shutdown_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Check invariants that the server relies on
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout.is_zero() {
            return Err(MtpError::Config(
                "idle timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured listen address into something `TcpListener::bind`
    /// accepts.
    ///
    /// - `""`      → `0.0.0.0:8080`
    /// - `":9000"` → `0.0.0.0:9000`
    /// - anything else is passed through untouched
    pub fn bind_addr(&self) -> String {
        let addr = self.listen_addr.trim();
        let addr = if addr.is_empty() { DEFAULT_ADDR } else { addr };
        match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => addr.to_string(),
        }
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the idle timeout applied to every connection
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the forced-abort deadline for shutdown (`None` disables it)
    pub fn shutdown_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
