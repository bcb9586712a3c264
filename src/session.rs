//! Session struct definition
//!
//! Represents one connected, named client: its outbound channel and
//! lifecycle state. The worker owns the connection itself; the registry
//! holds the Session so other workers' broadcasts can reach its channel.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::{SessionState, Username};

/// One registered session
///
/// The connection's write half is driven by the session's own write task,
/// fed exclusively through `sender`, so per-recipient delivery order follows
/// channel order.
#[derive(Debug)]
pub struct Session {
    /// Username assigned at handshake, immutable afterwards
    pub username: Username,
    /// Registry -> write-task line channel
    pub sender: mpsc::Sender<String>,
    /// Lifecycle state
    pub state: SessionState,
}

impl Session {
    /// Create a session in the `Connecting` state
    pub fn new(username: Username, sender: mpsc::Sender<String>) -> Self {
        Self {
            username,
            sender,
            state: SessionState::Connecting,
        }
    }

    /// Deliver one line into this session's outbound channel
    ///
    /// Non-blocking: a full channel means the recipient is too slow and the
    /// delivery is dropped rather than stalling the caller.
    pub fn send(&self, line: String) -> Result<(), SendError> {
        self.sender.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let session = Session::new(Username::new("alice"), tx);

        assert_eq!(session.username.as_str(), "alice");
        assert_eq!(session.state, SessionState::Connecting);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_session_send_delivers() {
        let (tx, mut rx) = mpsc::channel(32);
        let session = Session::new(Username::new("bob"), tx);

        session.send("hello".to_string()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_session_send_full_channel() {
        let (tx, _rx) = mpsc::channel(1);
        let session = Session::new(Username::new("carol"), tx);

        session.send("one".to_string()).unwrap();
        assert!(matches!(
            session.send("two".to_string()),
            Err(SendError::ChannelFull)
        ));
    }

    #[tokio::test]
    async fn test_session_send_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let session = Session::new(Username::new("dave"), tx);

        assert!(matches!(
            session.send("gone".to_string()),
            Err(SendError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_session_state_transitions() {
        let (tx, _rx) = mpsc::channel(1);
        let mut session = Session::new(Username::new("eve"), tx);

        session.set_state(SessionState::Active);
        assert!(session.is_active());
        session.set_state(SessionState::Closing);
        assert!(!session.is_active());
    }
}
