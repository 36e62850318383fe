//! Room struct definition
//!
//! Represents a named chat room and the set of clients currently in it.

use std::collections::HashMap;

use tracing::warn;

use crate::client::Outbox;
use crate::message::ServerMessage;
use crate::types::{ClientId, RoomName};

/// Multi-member chat room
///
/// Membership maps each client to its outbound queue so a broadcast
/// needs nothing but the room itself. Only the command processor
/// touches rooms, so there is no locking here.
#[derive(Debug)]
pub struct Room {
    /// Room name for identification
    pub name: RoomName,
    /// Current members
    members: HashMap<ClientId, Outbox>,
}

impl Room {
    /// Create an empty room; the registry adds the first member right away
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            members: HashMap::new(),
        }
    }

    /// Add a client; re-adding replaces its outbox
    pub fn add(&mut self, client_id: ClientId, outbox: Outbox) {
        self.members.insert(client_id, outbox);
    }

    /// Remove a client
    ///
    /// Returns true if the client was a member.
    pub fn remove(&mut self, client_id: ClientId) -> bool {
        self.members.remove(&client_id).is_some()
    }

    /// Check if a client is in this room
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains_key(&client_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Deliver `msg` to every member except `sender`
    ///
    /// Membership cannot change while this runs, so every member present
    /// at call time is attempted exactly once. Failed deliveries are
    /// logged and skipped. Returns the number of members reached.
    pub fn broadcast(&self, sender: ClientId, msg: &ServerMessage) -> usize {
        let mut delivered = 0;

        for (member_id, outbox) in &self.members {
            if *member_id == sender {
                continue;
            }
            match outbox.deliver(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    client = %member_id,
                    room = %self.name,
                    error = %e,
                    "Broadcast delivery failed"
                ),
            }
        }

        delivered
    }
}
