//! Command interpreter
//!
//! Classifies one decoded line into an intent by pattern-matching the literal
//! delimiters embedded in the human-readable chat-line format. Classification
//! precedence is fixed: Join, Leave, ListUsers, Help, Chat, Ignore.

use crate::message::{IDENTITY_DELIM, JOINED_PHRASE, NOTICE_MARKER};
use crate::types::Username;

/// Leave keyword, matched case-insensitively against the trailing field
pub const LEAVE_KEYWORD: &str = "bye";

/// List-users keyword, matched as a substring of the trailing field
pub const LIST_USERS_KEYWORD: &str = "allusers";

/// Help keyword, matched case-insensitively against the trailing field
pub const HELP_KEYWORD: &str = "help";

/// Parsed intent of one decoded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join announcement carrying the new session's username
    Join(Username),
    /// Client is disconnecting
    Leave,
    /// Private request for the numbered user listing
    ListUsers,
    /// Private request for the command summary
    Help,
    /// Ordinary message, broadcast verbatim (full formatted line)
    Chat(String),
    /// Empty or malformed line, dropped silently
    Ignore,
}

impl Command {
    /// Classify one decoded line
    ///
    /// The trailing field is everything after the final `]: ` delimiter;
    /// lines without the delimiter (other than a join announcement) are
    /// malformed and ignored.
    pub fn parse(line: &str) -> Command {
        if line.is_empty() {
            return Command::Ignore;
        }

        if line.starts_with(NOTICE_MARKER) && line.contains(JOINED_PHRASE) {
            return match extract_join_username(line) {
                Some(name) => Command::Join(name),
                None => Command::Ignore,
            };
        }

        let Some((_, trailing)) = line.rsplit_once(IDENTITY_DELIM) else {
            return Command::Ignore;
        };
        let field = trailing.trim();

        if field.eq_ignore_ascii_case(LEAVE_KEYWORD) {
            Command::Leave
        } else if field.to_lowercase().contains(LIST_USERS_KEYWORD) {
            Command::ListUsers
        } else if field.eq_ignore_ascii_case(HELP_KEYWORD) {
            Command::Help
        } else {
            Command::Chat(line.to_string())
        }
    }
}

/// Extract the username embedded in a join announcement
///
/// The name sits between the first `]: ` delimiter and the join phrase:
/// `~~ <timestamp> [Server]: <username> has joined the chat.`
fn extract_join_username(line: &str) -> Option<Username> {
    let (_, rest) = line.split_once(IDENTITY_DELIM)?;
    let (name, _) = rest.split_once(JOINED_PHRASE)?;
    let username = Username::new(name);
    if username.is_empty() {
        None
    } else {
        Some(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message;

    #[test]
    fn test_join_classification() {
        let line = message::join_announcement("alice");
        assert_eq!(Command::parse(&line), Command::Join(Username::new("alice")));
    }

    #[test]
    fn test_join_without_username_ignored() {
        let line = "~~ 2026/01/01 12:00:00 [Server]:  has joined the chat.";
        assert_eq!(Command::parse(line), Command::Ignore);
    }

    #[test]
    fn test_leave_case_insensitive() {
        assert_eq!(
            Command::parse("2026/01/01 12:00:00 [alice]: BYE"),
            Command::Leave
        );
        assert_eq!(
            Command::parse("2026/01/01 12:00:00 [alice]: bye "),
            Command::Leave
        );
    }

    #[test]
    fn test_list_users_substring_match() {
        assert_eq!(
            Command::parse("2026/01/01 12:00:00 [bob]: allusers"),
            Command::ListUsers
        );
        assert_eq!(
            Command::parse("2026/01/01 12:00:00 [bob]: show AllUsers now"),
            Command::ListUsers
        );
    }

    #[test]
    fn test_help_exact_match_only() {
        assert_eq!(
            Command::parse("2026/01/01 12:00:00 [carol]: HeLp"),
            Command::Help
        );
        assert!(matches!(
            Command::parse("2026/01/01 12:00:00 [carol]: help me"),
            Command::Chat(_)
        ));
    }

    #[test]
    fn test_chat_carries_full_line() {
        let line = "2026/01/01 12:00:00 [dave]: hello there";
        assert_eq!(Command::parse(line), Command::Chat(line.to_string()));
    }

    #[test]
    fn test_empty_and_malformed_ignored() {
        assert_eq!(Command::parse(""), Command::Ignore);
        assert_eq!(Command::parse("no delimiter here"), Command::Ignore);
        // terminator frames decode to the empty string
        assert_eq!(Command::parse(""), Command::Ignore);
    }

    #[test]
    fn test_leave_beats_chat_precedence() {
        // the trailing field is taken after the final delimiter
        let line = "2026/01/01 12:00:00 [eve]: bye";
        assert_eq!(Command::parse(line), Command::Leave);
    }
}
