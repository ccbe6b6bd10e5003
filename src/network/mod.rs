//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor (the thread that calls `serve`)
//! - One thread per accepted connection, strictly sequential inside it
//! - Every message routed through an application [`Handler`]
//! - Live connections tracked in a [`ConnectionRegistry`] for shutdown

mod client;
mod conn;
mod connection;
mod handler;
mod registry;
mod server;

pub use client::Client;
pub use conn::IdleConn;
pub use connection::Connection;
pub use handler::{Handler, ResponseWriter, Router};
pub use registry::{ConnectionGuard, ConnectionId, ConnectionRegistry, SHUTDOWN_LOG_INTERVAL};
pub use server::{Server, ServerState};
