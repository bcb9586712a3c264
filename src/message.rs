//! Wire text formats
//!
//! The human-readable chat line doubles as the transport payload and the
//! display string, so every notice the relay emits is built here from the
//! same literal delimiters the command interpreter matches against.

use chrono::Local;

use crate::types::Username;

/// Prefix marking a server notice line
pub const NOTICE_MARKER: &str = "~~";

/// Literal phrase embedded in a join announcement
pub const JOINED_PHRASE: &str = "has joined the chat.";

/// Delimiter separating the identity prefix from the message body
pub const IDENTITY_DELIM: &str = "]: ";

/// Timestamp pattern used on every line: YYYY/MM/DD HH:MM:SS
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Current local time in the wire timestamp format
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `<timestamp> [<username>]: <body>`
pub fn chat_line(username: &str, body: &str) -> String {
    format!("{} [{}]: {}", timestamp(), username, body)
}

/// `~~ <timestamp> [Server]: <username> has joined the chat.`
pub fn join_announcement(username: &str) -> String {
    format!(
        "{} {} [Server]: {} {}",
        NOTICE_MARKER,
        timestamp(),
        username,
        JOINED_PHRASE
    )
}

/// `~~ <timestamp> [Server]: <username> has left the chat.`
pub fn leave_notice(username: &Username) -> String {
    format!(
        "{} {} [Server]: {} has left the chat.",
        NOTICE_MARKER,
        timestamp(),
        username
    )
}

/// Local farewell shown only to the leaving client, never broadcast
pub fn farewell(username: &str) -> String {
    format!("{} [Server]: Goodbye, {}.", timestamp(), username)
}

/// Private rejection sent when a join carries an already-registered name
pub fn name_taken_notice(username: &Username) -> String {
    format!(
        "{} {} [Server]: the username \"{}\" is already taken.",
        NOTICE_MARKER,
        timestamp(),
        username
    )
}

/// One entry of the private `allusers` listing: `<n>.) <username>`
pub fn user_list_entry(index: usize, username: &Username) -> String {
    format!("{}.) {}", index, username)
}

/// Private multi-line command summary for `help`
pub fn help_menu() -> String {
    concat!(
        "help- print this menu\n",
        "bye- disconnect client from chat\n",
        "allusers- list all connected users\n",
    )
    .to_string()
}
