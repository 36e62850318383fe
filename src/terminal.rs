//! Line-based terminal client
//!
//! Dials the server, joins a room, then relays stdin lines to the
//! server and prints every line the server sends back.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info};

use crate::error::AppError;

/// Turn a typed line into a protocol line
///
/// Lines starting with `/` are sent as commands, anything else is
/// chat text for the current room. Blank input sends nothing.
pub fn outgoing_line(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        None
    } else if input.starts_with('/') {
        Some(input.to_string())
    } else {
        Some(format!("/msg {}", input))
    }
}

/// Run the client until the server closes the connection or stdin ends
pub async fn run_client(addr: SocketAddr, room: &str) -> Result<(), AppError> {
    let stream = TcpStream::connect(addr).await?;
    info!("Connected to {}", addr);

    let (read_half, write_half) = stream.into_split();
    let mut incoming = FramedRead::new(read_half, LinesCodec::new());
    let mut outgoing = FramedWrite::new(write_half, LinesCodec::new());
    let mut input = FramedRead::new(tokio::io::stdin(), LinesCodec::new());

    outgoing.send(format!("/join {}", room)).await?;

    loop {
        tokio::select! {
            line = incoming.next() => match line {
                Some(line) => println!("{}", line?),
                None => {
                    info!("Server closed the connection");
                    return Ok(());
                }
            },
            line = input.next() => match line {
                Some(line) => {
                    let line = line?;
                    if let Some(out) = outgoing_line(&line) {
                        // The server never echoes chat back to its sender
                        if let Some(text) = out.strip_prefix("/msg ") {
                            println!("You: {}", text);
                        }
                        outgoing.send(out).await?;
                    }
                }
                None => break,
            },
        }
    }

    // Stdin closed: say goodbye and print whatever is left
    debug!("Input closed, quitting");
    outgoing.send("/quit".to_string()).await?;
    while let Some(line) = incoming.next().await {
        println!("{}", line?);
    }

    Ok(())
}
