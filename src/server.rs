//! ChatServer Actor implementation
//!
//! The command processor: the one task that owns every client's session
//! state and the room registry. Connection tasks reach it only through
//! the command channel, so commands take effect strictly in the order
//! they were enqueued.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::{Client, Outbox};
use crate::error::AppError;
use crate::message::{Command, CommandKind, ServerMessage};
use crate::registry::RoomRegistry;
use crate::types::{ClientId, RoomName};

/// Commands sent from connection tasks to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect { client_id: ClientId, outbox: Outbox },
    /// A parsed line of client input
    Dispatch(Command),
    /// Client connection closed
    Disconnect { client_id: ClientId },
    /// Stop processing; every client is told and dropped
    Shutdown,
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// All active rooms
    registry: RoomRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            clients: HashMap::new(),
            registry: RoomRegistry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Processes commands until `Shutdown` arrives or all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            let stop = matches!(cmd, ServerCommand::Shutdown);
            self.handle_command(cmd);
            if stop {
                break;
            }
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, outbox } => self.handle_connect(client_id, outbox),
            ServerCommand::Dispatch(cmd) => self.handle_dispatch(cmd),
            ServerCommand::Disconnect { client_id } => self.handle_disconnect(client_id),
            ServerCommand::Shutdown => self.handle_shutdown(),
        }
    }

    fn handle_dispatch(&mut self, cmd: Command) {
        let Command {
            kind,
            client_id,
            word,
            args,
        } = cmd;

        // Lines may still be queued from a client that already quit
        if !self.clients.contains_key(&client_id) {
            debug!("Ignoring {} from unknown client {}", word, client_id);
            return;
        }

        match kind {
            CommandKind::Join => self.handle_join(client_id, &args),
            CommandKind::Nick => self.handle_nick(client_id, &args),
            CommandKind::ListRooms => self.handle_list_rooms(client_id),
            CommandKind::Msg => self.handle_msg(client_id, &args),
            CommandKind::Quit => self.handle_quit(client_id),
            CommandKind::Malformed => self.handle_malformed(client_id, word),
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, client_id: ClientId, outbox: Outbox) {
        if self.clients.contains_key(&client_id) {
            warn!("Client {} registered twice, replacing session", client_id);
            self.leave_current_room(client_id);
        }

        self.clients.insert(client_id, Client::new(client_id, outbox));
        info!("Client {} connected", client_id);
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle client disconnection without a `/quit`
    fn handle_disconnect(&mut self, client_id: ClientId) {
        if !self.clients.contains_key(&client_id) {
            return;
        }

        self.leave_current_room(client_id);
        self.clients.remove(&client_id);
        info!("Client {} disconnected", client_id);
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    fn handle_join(&mut self, client_id: ClientId, args: &[String]) {
        let [name] = args else {
            self.reply(client_id, AppError::RoomNameRequired.into());
            return;
        };
        let name = RoomName::from(name.as_str());

        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        if client.is_in(&name) {
            self.reply(client_id, AppError::AlreadyInRoom(name.to_string()).into());
            return;
        }

        self.leave_current_room(client_id);

        let Some(client) = self.clients.get_mut(&client_id) else {
            return;
        };
        client.room = Some(name.clone());
        let nick = client.nick.clone();
        let outbox = client.outbox.clone();

        let room = self.registry.join(&name, client_id, outbox);
        room.broadcast(
            client_id,
            &ServerMessage::Notice(format!("{} joined the room", nick)),
        );
        info!(client = %client_id, room = %name, "Client joined room");

        self.reply(client_id, ServerMessage::Reply(format!("welcome to {}", name)));
    }

    fn handle_nick(&mut self, client_id: ClientId, args: &[String]) {
        let [new_nick] = args else {
            self.reply(client_id, AppError::NicknameRequired.into());
            return;
        };

        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        let old_nick = client.nick.clone();

        // Roomless clients may rename too; there is just nobody to tell
        if let Some(room) = client.room.as_ref().and_then(|name| self.registry.get(name)) {
            room.broadcast(
                client_id,
                &ServerMessage::Notice(format!("{} renamed to {}", old_nick, new_nick)),
            );
        }
        self.reply(
            client_id,
            ServerMessage::Reply(format!("nickname changed to {}", new_nick)),
        );

        if let Some(client) = self.clients.get_mut(&client_id) {
            client.nick = new_nick.clone();
        }
        info!(client = %client_id, old = %old_nick, new = %new_nick, "Client changed nickname");
    }

    fn handle_list_rooms(&self, client_id: ClientId) {
        if self.registry.is_empty() {
            self.reply(
                client_id,
                ServerMessage::Reply(
                    "there are no rooms yet, /join ROOM_NAME will create one".to_string(),
                ),
            );
            return;
        }

        // One message, so the listing is never split or interleaved
        self.reply(client_id, ServerMessage::Rooms(self.registry.listing()));
    }

    fn handle_msg(&self, client_id: ClientId, args: &[String]) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };

        let Some(room_name) = client.room.as_ref() else {
            self.reply(client_id, AppError::NotInRoom.into());
            return;
        };

        if args.is_empty() {
            self.reply(client_id, AppError::MessageRequired.into());
            return;
        }

        let msg = ServerMessage::Chat {
            from: client.nick.clone(),
            text: args.join(" "),
        };
        if let Some(room) = self.registry.get(room_name) {
            room.broadcast(client_id, &msg);
        }
    }

    fn handle_quit(&mut self, client_id: ClientId) {
        info!("Client {} has left the chat", client_id);

        self.leave_current_room(client_id);
        self.reply(client_id, ServerMessage::Reply("see you soon!".to_string()));

        // Dropping the outbox lets the writer flush and close the socket
        self.clients.remove(&client_id);
    }

    fn handle_malformed(&self, client_id: ClientId, word: String) {
        if let Some(client) = self.clients.get(&client_id) {
            warn!(client = %client_id, nick = %client.nick, command = %word, "Unknown command");
        }
        self.reply(client_id, AppError::UnknownCommand(word).into());
    }

    fn handle_shutdown(&mut self) {
        info!("Shutting down with {} clients connected", self.clients.len());

        for client in self.clients.values() {
            if let Err(e) = client.send(ServerMessage::Reply("server is shutting down".to_string())) {
                warn!(client = %client.id, error = %e, "Shutdown notice delivery failed");
            }
        }
        self.clients.clear();
        self.registry.clear();
    }

    /// Helper: Take a client out of its room, notifying whoever remains
    fn leave_current_room(&mut self, client_id: ClientId) {
        let Some(client) = self.clients.get_mut(&client_id) else {
            return;
        };
        let Some(room_name) = client.room.take() else {
            return;
        };
        let notice = ServerMessage::Notice(format!("{} has left the room", client.nick));

        self.registry.leave(&room_name, client_id, &notice);
        info!(client = %client_id, room = %room_name, "Client left room");
    }

    /// Helper: Send a message to one client, logging delivery failures
    fn reply(&self, client_id: ClientId, msg: ServerMessage) {
        let Some(client) = self.clients.get(&client_id) else {
            return;
        };
        if let Err(e) = client.send(msg) {
            warn!(client = %client_id, error = %e, "Reply delivery failed");
        }
    }
}
