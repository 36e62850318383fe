//! Runtime configuration
//!
//! `Cli` is the command line surface of the binary; `ServerConfig` is
//! what the server itself needs.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use clap::Parser;

/// Default listen address (all interfaces, port 3000)
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Default depth of the shared command queue
pub const DEFAULT_QUEUE_DEPTH: usize = 100;

/// Longest accepted input line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Room the terminal client joins on connect
pub const DEFAULT_ROOM: &str = "lobby";

#[derive(Debug, Parser)]
#[command(name = "roomchat", version, about = "Multi-room TCP chat server and client")]
pub struct Cli {
    /// Address to listen on (server) or dial (client)
    #[arg(long, default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Depth of the shared command queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH, value_parser = parse_capacity)]
    pub queue_depth: usize,

    /// Longest accepted input line in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,

    /// Room the client joins after connecting
    #[arg(long, default_value = DEFAULT_ROOM)]
    pub room: String,

    /// Run as an interactive client instead of a server (any value)
    #[arg(value_name = "CLIENT")]
    pub client: Option<String>,
}

impl Cli {
    pub fn is_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.addr,
            queue_depth: self.queue_depth,
            max_line_length: self.max_line_length,
        }
    }

    /// Address the client should connect to
    pub fn dial_addr(&self) -> SocketAddr {
        dial_addr(self.addr)
    }
}

/// Server settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Capacity of the command channel shared by all readers
    pub queue_depth: usize,
    /// Longest input line; longer lines are discarded
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Queue capacities must be non-zero (tokio panics otherwise)
fn parse_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Map a wildcard listen address to loopback so it can be dialled
pub fn dial_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
