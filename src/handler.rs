//! TCP connection handler
//!
//! Handles individual client connections: registration with the
//! ChatServer, line parsing, and the outbound writer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

use crate::client::Outbox;
use crate::codec::{InboundLine, LineDecoder};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::{Command, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Registers the client, then runs a read task (lines -> commands) and
/// a write task (outbox -> lines) until either side ends. Teardown
/// always enqueues a `Disconnect`, which is a no-op if the client quit.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: ServerConfig,
) -> Result<(), AppError> {
    let client_id = ClientId::from(stream.peer_addr()?);
    let (read_half, write_half) = stream.into_split();

    let lines = FramedRead::new(read_half, LineDecoder::new(config.max_line_length));
    let mut sink = FramedWrite::new(write_half, LinesCodec::new());

    // Channel for server -> client messages; unbounded so a slow reader
    // never loses lines
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Register with ChatServer before any of this client's commands
    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            outbox: Outbox::new(msg_tx),
        })
        .await
        .is_err()
    {
        warn!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    let mut read_task = tokio::spawn(read_loop(client_id, lines, cmd_tx.clone()));

    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = sink.send(msg.to_string()).await {
                warn!(client = %client_id, error = %e, "Write failed, ending write task");
                break;
            }
        }
        debug!("Write task ended for {}", client_id);

        if let Err(e) = SinkExt::<String>::close(&mut sink).await {
            debug!(client = %client_id, error = %e, "Closing socket failed");
        }
    });

    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", client_id);
        }
        _ = &mut write_task => {
            // Quit, shutdown, or a dead socket; stop reading too
            read_task.abort();
            debug!("Write task completed for {}", client_id);
        }
    }

    if let Err(e) = cmd_tx.send(ServerCommand::Disconnect { client_id }).await {
        warn!(client = %client_id, error = %e, "Failed to report disconnect");
    }
    info!("Connection from {} closed", client_id);

    Ok(())
}

/// Read lines until the peer goes away, enqueueing one command per line
///
/// Enqueue waits while the command channel is full, so a busy processor
/// slows every reader. Over-long lines are dropped; only I/O errors end
/// the loop.
async fn read_loop(
    client_id: ClientId,
    mut lines: FramedRead<OwnedReadHalf, LineDecoder>,
    cmd_tx: mpsc::Sender<ServerCommand>,
) {
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(InboundLine::Text(line)) => line,
            Ok(InboundLine::TooLong) => {
                warn!(client = %client_id, "Discarding over-long line");
                continue;
            }
            Err(e) => {
                warn!(client = %client_id, error = %e, "Read failed, ending read task");
                break;
            }
        };

        let Some(cmd) = Command::parse(client_id, &line) else {
            continue;
        };

        if cmd_tx.send(ServerCommand::Dispatch(cmd)).await.is_err() {
            debug!("Server closed, ending read task for {}", client_id);
            break;
        }
    }
    debug!("Read task ended for {}", client_id);
}
