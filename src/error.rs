//! Error types for the chat relay
//!
//! Defines application-level errors and outbound send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal per-session errors (the worker tears down) and codec
/// errors surfaced while framing the wire protocol. None of these is
/// ever fatal to the server process itself.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on a session's connection
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame payload exceeds the u16 length prefix
    #[error("frame payload of {0} bytes exceeds the 65535-byte limit")]
    FrameTooLong(usize),

    /// Frame payload is not valid UTF-8
    #[error("frame payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Relay command channel closed (actor gone - internal failure)
    #[error("relay command channel closed")]
    ChannelSend,

    /// First frame from a peer was not a join announcement
    #[error("handshake failed: first frame was not a join announcement")]
    HandshakeFailed,
}

/// Handshake registration errors
///
/// Answered over the join reply channel; the worker reports the cause
/// privately and closes without registering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// Another live session already holds this username
    #[error("username \"{0}\" is already taken")]
    UsernameTaken(String),
}

/// Outbound delivery errors
///
/// Occurs when delivering a line into a session's outbound channel.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("channel closed")]
    ChannelClosed,
    /// The recipient's channel is full (slow consumer); delivery dropped
    #[error("channel full")]
    ChannelFull,
}
