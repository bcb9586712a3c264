//! Relay server actor and connection acceptor
//!
//! The central actor owns the session registry: a `HashMap` from username to
//! [`Session`]. All registration, teardown, private replies, and broadcast
//! fan-out go through its command channel, so no worker ever touches the map
//! directly and no locking is needed.
//!
//! Broadcast delivery is best-effort: each recipient is attempted
//! independently through its own outbound channel, and a dead or saturated
//! recipient is logged and skipped without disturbing the rest of the fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{AppError, JoinError};
use crate::handler::handle_session;
use crate::message;
use crate::session::Session;
use crate::types::{SessionState, Username};

/// Buffer size for the actor's command channel
pub const COMMAND_CHANNEL_SIZE: usize = 256;

/// Commands sent from session workers to the relay actor
#[derive(Debug)]
pub enum RelayCommand {
    /// Register a session at handshake and announce it to everyone else
    Join {
        username: Username,
        sender: mpsc::Sender<String>,
        /// The join announcement line, broadcast verbatim (excluding the joiner)
        announcement: String,
        reply: oneshot::Sender<Result<(), JoinError>>,
    },
    /// Explicit leave: broadcast the leave notice to everyone, then deregister
    Leave { username: Username },
    /// Broadcast one chat line verbatim to every registered session
    Chat { line: String },
    /// Private numbered user listing for the requester
    ListUsers { username: Username },
    /// Private command summary for the requester
    Help { username: Username },
    /// Worker teardown after its receive loop ended for any reason
    ///
    /// No-op when a processed Leave already removed the session, which is
    /// what makes teardown idempotent.
    Disconnect { username: Username },
}

/// The relay actor: session registry plus broadcast dispatcher
pub struct RelayServer {
    /// All registered sessions: username -> Session, keys unique
    sessions: HashMap<Username, Session>,
    /// Command receiver channel
    receiver: mpsc::Receiver<RelayCommand>,
}

impl RelayServer {
    pub fn new(receiver: mpsc::Receiver<RelayCommand>) -> Self {
        Self {
            sessions: HashMap::new(),
            receiver,
        }
    }

    /// Run the relay event loop
    ///
    /// Processes commands until every worker-side sender is dropped.
    pub async fn run(mut self) {
        info!("relay actor started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("relay actor shutting down");
    }

    fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Join {
                username,
                sender,
                announcement,
                reply,
            } => self.handle_join(username, sender, announcement, reply),
            RelayCommand::Leave { username } => self.handle_leave(&username),
            RelayCommand::Chat { line } => self.handle_chat(line),
            RelayCommand::ListUsers { username } => self.handle_list_users(&username),
            RelayCommand::Help { username } => self.handle_help(&username),
            RelayCommand::Disconnect { username } => self.handle_disconnect(&username),
        }
    }

    /// Register a session and announce it to every other session
    ///
    /// Duplicate usernames are rejected so a new connection can never orphan
    /// an existing session's registry entry.
    fn handle_join(
        &mut self,
        username: Username,
        sender: mpsc::Sender<String>,
        announcement: String,
        reply: oneshot::Sender<Result<(), JoinError>>,
    ) {
        if self.sessions.contains_key(&username) {
            warn!("rejected join: username '{}' already registered", username);
            let _ = reply.send(Err(JoinError::UsernameTaken(username.to_string())));
            return;
        }

        info!("{}", announcement);
        self.broadcast_except(&announcement, &username);

        let mut session = Session::new(username.clone(), sender);
        session.set_state(SessionState::Active);
        self.sessions.insert(username, session);
        debug!("registered sessions: {}", self.sessions.len());

        let _ = reply.send(Ok(()));
    }

    /// Broadcast the leave notice (leaver included) and deregister
    ///
    /// A username that is no longer registered is a no-op, so a Leave that
    /// races a Disconnect resolves to exactly one notice.
    fn handle_leave(&mut self, username: &Username) {
        let Some(session) = self.sessions.get_mut(username) else {
            return;
        };
        session.set_state(SessionState::Closing);

        let notice = message::leave_notice(username);
        info!("{}", notice);
        self.broadcast_all(&notice);

        if let Some(mut session) = self.sessions.remove(username) {
            session.set_state(SessionState::Closed);
        }
        debug!("registered sessions: {}", self.sessions.len());
    }

    /// Broadcast one chat line to every registered session, sender included
    fn handle_chat(&mut self, line: String) {
        info!("{}", line);
        self.broadcast_all(&line);
    }

    /// Private reply: one numbered line per registered session
    ///
    /// Enumeration order is unspecified but stable within one response.
    fn handle_list_users(&mut self, username: &Username) {
        let Some(session) = self.sessions.get(username) else {
            return;
        };

        for (index, name) in self.sessions.keys().enumerate() {
            if let Err(e) = session.send(message::user_list_entry(index + 1, name)) {
                warn!("failed to deliver user listing to '{}': {}", username, e);
                break;
            }
        }
    }

    /// Private reply: the command summary menu
    fn handle_help(&mut self, username: &Username) {
        let Some(session) = self.sessions.get(username) else {
            return;
        };

        if let Err(e) = session.send(message::help_menu()) {
            warn!("failed to deliver help menu to '{}': {}", username, e);
        }
    }

    /// Teardown for a worker whose receive loop ended
    ///
    /// An ungraceful disconnect still broadcasts the leave notice when the
    /// session was registered; after an explicit Leave this is a no-op.
    fn handle_disconnect(&mut self, username: &Username) {
        if self.sessions.contains_key(username) {
            debug!("session '{}' disconnected without a leave command", username);
            self.handle_leave(username);
        }
    }

    /// Deliver one line to every registered session
    fn broadcast_all(&self, line: &str) {
        for session in self.sessions.values() {
            if let Err(e) = session.send(line.to_string()) {
                warn!("failed to deliver to '{}': {}", session.username, e);
            }
        }
    }

    /// Deliver one line to every registered session except one
    ///
    /// Used only for the join notice, so the announcing client does not see
    /// its own join echoed back.
    fn broadcast_except(&self, line: &str, exclude: &Username) {
        for session in self.sessions.values() {
            if &session.username == exclude {
                continue;
            }
            if let Err(e) = session.send(line.to_string()) {
                warn!("failed to deliver to '{}': {}", session.username, e);
            }
        }
    }
}

/// Accept connections and spawn one session worker per connection
///
/// Spawns the relay actor, then loops forever: acquire a session permit,
/// accept, hand the stream to [`handle_session`]. A failed accept is logged
/// and the loop continues; only the caller's bind can be fatal.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<(), AppError> {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    tokio::spawn(RelayServer::new(cmd_rx).run());

    let limiter = Arc::new(Semaphore::new(config.max_sessions));
    info!("chat relay listening on {}", listener.local_addr()?);

    loop {
        // held for the lifetime of the session task
        let permit = match limiter.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Ok(()),
        };

        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("new connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = handle_session(stream, cmd_tx, &config).await {
                        error!("session worker error: {}", e);
                    }
                });
            }
            Err(e) => {
                drop(permit);
                error!("failed to accept connection: {}", e);
            }
        }
    }
}
