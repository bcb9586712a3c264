//! Basic type definitions for the chat relay
//!
//! Provides:
//! - `Username`: newtype key for the session registry
//! - `SessionState`: lifecycle state of one connected session
//! - `DisconnectReason`: why a worker left its receive loop

/// Registered username (newtype pattern)
///
/// Assigned once at handshake and immutable afterwards.
/// Implements Hash and Eq for use as the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username from handshake input (surrounding whitespace trimmed)
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A username that trimmed down to nothing is not usable as a registry key
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Lifecycle state of a session
///
/// Created as `Connecting` during handshake, `Active` once registered,
/// `Closing` when a Leave or I/O failure is observed, `Closed` after
/// teardown removes it from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

/// Why a session worker left its receive loop
///
/// Distinguishes an explicit Leave and a clean peer close from a genuine
/// I/O fault so teardown logging does not conflate them.
#[derive(Debug)]
pub enum DisconnectReason {
    /// Client issued the leave command
    Leave,
    /// Peer closed the connection without a leave command
    PeerClosed,
    /// No frame arrived within the configured idle timeout
    IdleTimeout,
    /// Receive failed mid-session
    Io(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_trims() {
        let name = Username::new("  alice ");
        assert_eq!(name.as_str(), "alice");
        assert!(!name.is_empty());
    }

    #[test]
    fn test_username_empty() {
        assert!(Username::new("   ").is_empty());
    }

    #[test]
    fn test_username_equality() {
        assert_eq!(Username::new("bob"), Username::from("bob"));
        assert_ne!(Username::new("bob"), Username::new("Bob"));
    }
}
