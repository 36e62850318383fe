//! Client struct definition
//!
//! Represents a connected client with their session state and the
//! handle used to queue lines for their connection writer.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, RoomName};

/// Nickname every client starts with
pub const DEFAULT_NICK: &str = "anon";

/// Outbound queue of one connection
///
/// Cloned into every room the client joins. Delivery never waits and
/// never drops: a slow peer only grows its own queue, and the queue goes
/// away with the connection.
#[derive(Debug, Clone)]
pub struct Outbox(mpsc::UnboundedSender<ServerMessage>);

impl Outbox {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self(sender)
    }

    /// Queue a message for the connection writer
    pub fn deliver(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.0.send(msg).map_err(|_| SendError::ChannelClosed)
    }
}

/// Connected client information
///
/// Only the command processor holds these, so the mutable fields need
/// no synchronization.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name, `anon` until changed
    pub nick: String,
    /// Room the client is currently in
    pub room: Option<RoomName>,
    /// Server → Client message queue
    pub outbox: Outbox,
}

impl Client {
    /// Create a new roomless client with the default nickname
    pub fn new(id: ClientId, outbox: Outbox) -> Self {
        Self {
            id,
            nick: DEFAULT_NICK.to_string(),
            room: None,
            outbox,
        }
    }

    /// Send a message to this client
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.outbox.deliver(msg)
    }

    pub fn is_in(&self, room: &RoomName) -> bool {
        self.room.as_ref() == Some(room)
    }
}
