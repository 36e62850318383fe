//! Room registry
//!
//! Maps room names to rooms. Rooms are created on first join and removed
//! in the same step that takes their last member out, so an empty room
//! is never observable from outside.

use std::collections::HashMap;

use tracing::debug;

use crate::client::Outbox;
use crate::message::ServerMessage;
use crate::room::Room;
use crate::types::{ClientId, RoomName};

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomName, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client to the named room, creating the room if needed
    pub fn join(&mut self, name: &RoomName, client_id: ClientId, outbox: Outbox) -> &Room {
        let room = self.rooms.entry(name.clone()).or_insert_with(|| {
            debug!("Room {} created", name);
            Room::new(name.clone())
        });
        room.add(client_id, outbox);
        room
    }

    /// Remove a client from the named room
    ///
    /// If members remain they receive `notice`; otherwise the room is
    /// deleted. Returns true if the room was deleted.
    pub fn leave(&mut self, name: &RoomName, client_id: ClientId, notice: &ServerMessage) -> bool {
        let Some(room) = self.rooms.get_mut(name) else {
            return false;
        };

        room.remove(client_id);

        if room.is_empty() {
            self.rooms.remove(name);
            debug!("Room {} deleted (empty)", name);
            return true;
        }

        room.broadcast(client_id, notice);
        false
    }

    pub fn get(&self, name: &RoomName) -> Option<&Room> {
        self.rooms.get(name)
    }

    /// Name and member count of every room, in unspecified order
    pub fn listing(&self) -> Vec<(RoomName, usize)> {
        self.rooms
            .values()
            .map(|room| (room.name.clone(), room.member_count()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Drop every room
    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
