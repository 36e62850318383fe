//! Multi-room TCP Chat Server Library
//!
//! A line-oriented chat service: clients connect over TCP, pick a
//! nickname, join named rooms and broadcast text to everyone else in
//! the same room.
//!
//! # Protocol
//! - `/join ROOM` - create or join a room, leaving the current one
//! - `/nick NAME` - change nickname
//! - `/rooms` - list rooms and member counts
//! - `/msg TEXT...` - send text to the current room
//! - `/quit` - leave and disconnect
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning all clients and rooms
//! - Each connection has a read task feeding it commands and a write
//!   task draining the client's outbox
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use roomchat::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     serve(listener, ServerConfig::default(), std::future::pending()).await.unwrap();
//! }
//! ```

pub mod acceptor;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod terminal;
pub mod types;

// Re-export main types for convenience
pub use acceptor::{run, serve};
pub use client::{Client, Outbox};
pub use codec::{InboundLine, LineDecoder};
pub use config::{Cli, ServerConfig};
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{Command, CommandKind, ServerMessage};
pub use registry::RoomRegistry;
pub use room::Room;
pub use server::{ChatServer, ServerCommand};
pub use terminal::run_client;
pub use types::{ClientId, RoomName};
