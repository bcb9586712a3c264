//! TCP Chat Relay Library
//!
//! A terminal-based chat relay: every message from any connected client is
//! fanned out to all others, with a few control commands answered privately.
//!
//! # Features
//! - Length-prefixed UTF-8 text frames (payload plus empty terminator)
//! - Join handshake establishing a unique username per session
//! - Broadcast fan-out with per-recipient failure isolation
//! - Private `allusers` and `help` replies
//! - Bounded concurrent sessions and optional idle timeout
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RelayServer` is the central actor owning the session registry
//! - Each connection has a worker task communicating with the relay
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tcpchat::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default().with_port(5000);
//!     let listener = TcpListener::bind(config.bind_addr()).await.unwrap();
//!     serve(listener, config).await.unwrap();
//! }
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use codec::FrameCodec;
pub use command::Command;
pub use config::{resolve_port, PortFallback, ServerConfig, DEFAULT_PORT};
pub use error::{AppError, JoinError, SendError};
pub use handler::handle_session;
pub use server::{serve, RelayCommand, RelayServer};
pub use session::Session;
pub use types::{DisconnectReason, SessionState, Username};
