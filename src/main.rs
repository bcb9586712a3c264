//! TCP Chat Relay - Server Entry Point
//!
//! Resolves the listening port from argv, binds, and runs the accept loop.
//! A missing or invalid port falls back to the default with a diagnostic;
//! a port that cannot be bound is fatal.

use std::env;
use std::io::ErrorKind;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tcpchat::{resolve_port, serve, PortFallback, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=tcpchat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcpchat=info")),
        )
        .init();

    let arg = env::args().nth(1);
    let (port, fallback) = resolve_port(arg.as_deref());
    match fallback {
        Some(PortFallback::NotProvided) => {
            warn!("no port provided, defaulting to {}", port);
        }
        Some(PortFallback::NonNumeric(raw)) => {
            warn!(
                "port \"{}\" contains special characters or letters, defaulting to {}",
                raw, port
            );
        }
        Some(PortFallback::OutOfRange(raw)) => {
            warn!("port \"{}\" is out of range, defaulting to {}", raw, port);
        }
        None => {}
    }

    let config = ServerConfig::default().with_port(port);
    let listener = match TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            error!(
                "port {} is already in use by another process on this machine",
                port
            );
            return Err(e.into());
        }
        Err(e) => {
            error!("error establishing server on port {}: {}", port, e);
            return Err(e.into());
        }
    };

    info!("server started, awaiting client login...");
    serve(listener, config).await?;

    Ok(())
}
