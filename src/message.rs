//! Message protocol definitions
//!
//! Line-oriented text protocol: every inbound line is parsed into a
//! [`Command`], every outbound [`ServerMessage`] renders as one line.

use std::fmt;

use crate::error::AppError;
use crate::types::{ClientId, RoomName};

/// Kind of an inbound command, selected by its first token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `/join ROOM`
    Join,
    /// `/nick NAME`
    Nick,
    /// `/rooms`
    ListRooms,
    /// `/msg TEXT...`
    Msg,
    /// `/quit`
    Quit,
    /// Anything else
    Malformed,
}

impl CommandKind {
    /// Map a command word to its kind (case-sensitive, slash required)
    pub fn from_word(word: &str) -> Self {
        match word {
            "/join" => CommandKind::Join,
            "/nick" => CommandKind::Nick,
            "/rooms" => CommandKind::ListRooms,
            "/msg" => CommandKind::Msg,
            "/quit" => CommandKind::Quit,
            _ => CommandKind::Malformed,
        }
    }
}

/// One parsed line of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Connection that sent the line
    pub client_id: ClientId,
    /// The command word as typed, e.g. `/join` or `/foo`
    pub word: String,
    /// Tokens following the command word
    pub args: Vec<String>,
}

impl Command {
    /// Parse one line of input
    ///
    /// Returns `None` for a blank line, which is skipped rather than
    /// reported as malformed.
    pub fn parse(client_id: ClientId, line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let word = tokens.next()?;

        Some(Self {
            kind: CommandKind::from_word(word),
            client_id,
            word: word.to_string(),
            args: tokens.map(str::to_string).collect(),
        })
    }
}

/// Server → Client message
///
/// Rendered by its `Display` impl; the writer appends the final newline.
/// Only `Rooms` spans several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Private reply to one client, rendered with a `> ` prefix
    Reply(String),
    /// Room event sentence (join, leave, rename)
    Notice(String),
    /// Chat line broadcast by `/msg`
    Chat { from: String, text: String },
    /// `/rooms` listing: one reply line per room name and member count
    Rooms(Vec<(RoomName, usize)>),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Reply(text) => write!(f, "> {}", text),
            ServerMessage::Notice(text) => write!(f, "{}", text),
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::Rooms(rooms) => {
                for (i, (name, count)) in rooms.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    let noun = if *count == 1 { "member" } else { "members" };
                    write!(f, "> {} | {} {}", name, count, noun)?;
                }
                Ok(())
            }
        }
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        match err {
            // Fatal errors are not sent to clients; the connection closes
            AppError::Bind { .. } | AppError::Io(_) | AppError::Lines(_) | AppError::ChannelSend => {
                ServerMessage::Reply("internal error".to_string())
            }
            other => ServerMessage::Reply(other.to_string()),
        }
    }
}
