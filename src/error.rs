//! Error types for the chat server
//!
//! Defines application-level errors and outbound delivery errors.
//! Uses thiserror for ergonomic error definitions.

use std::net::SocketAddr;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Covers both fatal errors (connection or process termination) and
/// command errors, whose display text is sent back to the issuing client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Listening socket could not be bound (fatal at startup)
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error (fatal for the connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (fatal for the connection)
    #[error("line framing error: {0}")]
    Lines(#[from] LinesCodecError),

    /// Channel send error (fatal - command processor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// `/join` without exactly one room name
    #[error("room name is required. usage: /join ROOM_NAME")]
    RoomNameRequired,

    /// `/nick` without exactly one nickname
    #[error("bad command. usage: /nick NAME")]
    NicknameRequired,

    /// `/msg` without any text
    #[error("message is required. usage: /msg MESSAGE")]
    MessageRequired,

    /// `/msg` while not in a room
    #[error("you need to join a room first, try /rooms")]
    NotInRoom,

    /// `/join` of the room the client is already in
    #[error("you are already in {0}")]
    AlreadyInRoom(String),

    /// Unrecognized command word
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Outbound delivery errors
///
/// Occurs when a message cannot be queued for a client's writer.
#[derive(Debug, Error)]
pub enum SendError {
    /// The client's writer has gone away
    #[error("Channel closed")]
    ChannelClosed,
}
