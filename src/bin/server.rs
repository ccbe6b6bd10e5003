//! MTP Server Binary
//!
//! Serves the product catalog over MTP until interrupted.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use mtp::market::{self, Market, MemoryProductService};
use mtp::{MtpError, Server, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// How long to wait for the listener before re-checking the server thread
const STARTUP_WAIT: Duration = Duration::from_millis(100);

/// MTP Server
#[derive(Parser, Debug)]
#[command(name = "mtp-server")]
#[command(about = "Product catalog server speaking the Message Transfer Protocol")]
#[command(version)]
struct Args {
    /// Listen address (host:port, or :port for all interfaces)
    #[arg(short, long, default_value = mtp::config::DEFAULT_ADDR)]
    listen: String,

    /// Seconds of silence before a connection is closed
    #[arg(short, long, default_value = "30")]
    idle_timeout: u64,

    /// Seconds to wait for connections on shutdown before forcing them
    /// closed (0 waits forever)
    #[arg(short, long, default_value = "10")]
    shutdown_timeout: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mtp=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("MTP Server v{}", mtp::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let shutdown_timeout = match args.shutdown_timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let config = ServerConfig::builder()
        .listen_addr(&args.listen)
        .idle_timeout(Duration::from_secs(args.idle_timeout))
        .shutdown_timeout(shutdown_timeout)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(2);
    }

    let market = Arc::new(Market::new(MemoryProductService::new()));
    let server = Arc::new(Server::new(config, market::router(market)));

    // Forward Ctrl+C / SIGTERM to the main thread
    let (signal_tx, signal_rx) = channel::bounded(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    // Serve on a separate thread so this one can wait for signals
    let (done_tx, done_rx) = channel::bounded(1);
    let serving = Arc::clone(&server);
    let server_thread = thread::Builder::new()
        .name("mtp-accept".to_string())
        .spawn(move || {
            let _ = done_tx.send(serving.listen_and_serve());
        });
    let server_thread = match server_thread {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to start server thread: {}", e);
            std::process::exit(1);
        }
    };

    select! {
        recv(signal_rx) -> _ => {
            tracing::info!("Received interrupt, initiating shutdown...");
            if let Err(e) = shutdown_once_started(&server, &done_rx) {
                tracing::error!("Shutdown error: {}", e);
                std::process::exit(1);
            }
        }
        recv(done_rx) -> result => {
            // Only reachable when serving failed before any shutdown
            if let Ok(Err(e)) = result {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let _ = server_thread.join();
    tracing::info!("Server stopped");
}

/// Shut down, waiting out a signal that arrived before the server listened
///
/// Returns the serving thread's error if it failed during startup.
fn shutdown_once_started(server: &Server, done_rx: &Receiver<mtp::Result<()>>) -> mtp::Result<()> {
    loop {
        match server.shutdown() {
            Err(MtpError::NotListening) => {
                if let Ok(result) = done_rx.try_recv() {
                    return result;
                }
                server.wait_started(STARTUP_WAIT);
            }
            result => return result,
        }
    }
}
