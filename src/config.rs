//! Server configuration
//!
//! Builder-style configuration plus the argv port resolution rules: a
//! missing or invalid port falls back to the documented default with a
//! cause-specific diagnostic, while an unbindable port is fatal later at
//! startup.

use std::num::IntErrorKind;
use std::time::Duration;

/// Default listening port when none is provided or the input is invalid
pub const DEFAULT_PORT: u16 = 5000;

/// Server configuration
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tcpchat::ServerConfig;
///
/// let config = ServerConfig::default()
///     .with_port(3000)
///     .with_max_sessions(256)
///     .with_idle_timeout(Some(Duration::from_secs(600)));
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,

    /// Maximum number of concurrent sessions
    ///
    /// Further connections wait for a permit before being accepted.
    pub max_sessions: usize,

    /// Optional read timeout for idle sessions
    ///
    /// `None` lets an idle connection hold its resources indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_sessions: 1024,
            idle_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Address string passed to the listener bind call
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Why the configured port fell back to the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortFallback {
    /// No port argument was provided
    NotProvided,
    /// The argument contains letters or special characters
    NonNumeric(String),
    /// The argument is numeric but outside the valid port range
    OutOfRange(String),
}

/// Resolve the argv port argument
///
/// Returns the port to use and, when falling back to [`DEFAULT_PORT`],
/// the distinguishing cause for the caller to log.
pub fn resolve_port(arg: Option<&str>) -> (u16, Option<PortFallback>) {
    let Some(raw) = arg else {
        return (DEFAULT_PORT, Some(PortFallback::NotProvided));
    };

    match raw.trim().parse::<u16>() {
        Ok(port) => (port, None),
        Err(e) => {
            let cause = match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    PortFallback::OutOfRange(raw.to_string())
                }
                _ => PortFallback::NonNumeric(raw.to_string()),
            };
            (DEFAULT_PORT, Some(cause))
        }
    }
}
