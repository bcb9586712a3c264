//! Session worker
//!
//! Owns one connection end-to-end: handshake, main receive loop, dispatch,
//! teardown. The connection is framed with [`FrameCodec`] and split; the
//! write half is driven by a spawned task draining the session's outbound
//! channel, so broadcasts from other workers never touch this worker's read
//! path. Any failure here terminates only this session.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::FrameCodec;
use crate::command::Command;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message;
use crate::server::RelayCommand;
use crate::types::{DisconnectReason, Username};

/// Buffer size for a session's outbound line channel
const OUTBOUND_CHANNEL_SIZE: usize = 32;

type FrameSink = SplitSink<Framed<TcpStream, FrameCodec>, String>;
type FrameStream = SplitStream<Framed<TcpStream, FrameCodec>>;

/// Handle one accepted connection
///
/// Performs the join handshake, registers the session with the relay actor,
/// then runs the receive loop until a Leave, peer close, idle timeout, or
/// I/O failure. Teardown always sends a final Disconnect command; the actor
/// makes that idempotent.
pub async fn handle_session(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<RelayCommand>,
    config: &ServerConfig,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let framed = Framed::new(stream, FrameCodec);
    let (mut sink, mut frames) = framed.split();

    // Handshake: the first non-empty frame must be a join announcement
    let Some((username, announcement)) = handshake(&mut frames, config).await? else {
        debug!("peer {} closed before completing handshake", peer_addr);
        return Ok(());
    };
    info!("'{}' connected from {}", username, peer_addr);

    // Register with the relay; the outbound channel is how every other
    // worker's broadcasts reach this connection.
    let (line_tx, line_rx) = mpsc::channel::<String>(OUTBOUND_CHANNEL_SIZE);
    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx
        .send(RelayCommand::Join {
            username: username.clone(),
            sender: line_tx,
            announcement,
            reply: reply_tx,
        })
        .await
        .map_err(|_| AppError::ChannelSend)?;

    if reply_rx.await.map_err(|_| AppError::ChannelSend)?.is_err() {
        let _ = sink.send(message::name_taken_notice(&username)).await;
        let _ = sink.close().await;
        return Ok(());
    }

    // Write task: drains the outbound channel into the framed sink. Ends
    // when the registry drops the session's sender at teardown.
    let write_task = tokio::spawn(write_loop(sink, line_rx));

    let reason = read_loop(&mut frames, &cmd_tx, &username, config).await;
    match &reason {
        DisconnectReason::Leave => info!("'{}' left the chat", username),
        DisconnectReason::PeerClosed => info!("'{}' closed the connection", username),
        DisconnectReason::IdleTimeout => info!("'{}' idle, closing", username),
        DisconnectReason::Io(e) => warn!("'{}' receive failed: {}", username, e),
    }

    let _ = cmd_tx
        .send(RelayCommand::Disconnect {
            username: username.clone(),
        })
        .await;
    let _ = write_task.await;

    Ok(())
}

/// Read the join announcement that opens every session
///
/// Empty terminator frames are skipped. `Ok(None)` means the peer closed
/// before announcing; any other first frame fails the handshake.
async fn handshake(
    frames: &mut FrameStream,
    config: &ServerConfig,
) -> Result<Option<(Username, String)>, AppError> {
    loop {
        let line = match next_frame(frames, config).await? {
            Received::Line(line) => line,
            // silent or closed before announcing; no session to tear down
            Received::Closed | Received::TimedOut => return Ok(None),
        };

        match Command::parse(&line) {
            Command::Ignore => continue,
            Command::Join(username) => return Ok(Some((username, line))),
            _ => return Err(AppError::HandshakeFailed),
        }
    }
}

/// Outcome of one receive attempt
enum Received {
    Line(String),
    Closed,
    TimedOut,
}

/// Main receive loop: classify each decoded frame and dispatch
async fn read_loop(
    frames: &mut FrameStream,
    cmd_tx: &mpsc::Sender<RelayCommand>,
    username: &Username,
    config: &ServerConfig,
) -> DisconnectReason {
    loop {
        let line = match next_frame(frames, config).await {
            Ok(Received::Line(line)) => line,
            Ok(Received::Closed) => return DisconnectReason::PeerClosed,
            Ok(Received::TimedOut) => return DisconnectReason::IdleTimeout,
            Err(AppError::Io(e)) => return DisconnectReason::Io(e),
            Err(e) => {
                // undecodable frame from this peer, terminal for this session only
                return DisconnectReason::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    e.to_string(),
                ));
            }
        };

        let cmd = match Command::parse(&line) {
            Command::Ignore => continue,
            Command::Join(_) => {
                warn!("'{}' sent a second join announcement, ignoring", username);
                continue;
            }
            Command::Leave => {
                let _ = cmd_tx
                    .send(RelayCommand::Leave {
                        username: username.clone(),
                    })
                    .await;
                return DisconnectReason::Leave;
            }
            Command::ListUsers => RelayCommand::ListUsers {
                username: username.clone(),
            },
            Command::Help => RelayCommand::Help {
                username: username.clone(),
            },
            Command::Chat(line) => RelayCommand::Chat { line },
        };

        if cmd_tx.send(cmd).await.is_err() {
            debug!("relay actor gone, ending session '{}'", username);
            return DisconnectReason::PeerClosed;
        }
    }
}

/// Receive one frame, applying the configured idle timeout if any
async fn next_frame(frames: &mut FrameStream, config: &ServerConfig) -> Result<Received, AppError> {
    let item = match config.idle_timeout {
        Some(limit) => match timeout(limit, frames.next()).await {
            Ok(item) => item,
            Err(_) => return Ok(Received::TimedOut),
        },
        None => frames.next().await,
    };

    match item {
        Some(Ok(line)) => Ok(Received::Line(line)),
        Some(Err(e)) => Err(e),
        None => Ok(Received::Closed),
    }
}

/// Drain outbound lines into the framed sink until the channel closes
async fn write_loop(mut sink: FrameSink, mut line_rx: mpsc::Receiver<String>) {
    while let Some(line) = line_rx.recv().await {
        if sink.send(line).await.is_err() {
            debug!("outbound send failed, ending write task");
            break;
        }
    }
    let _ = sink.close().await;
}
