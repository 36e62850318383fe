//! Connection acceptor
//!
//! Binds the listener, starts the ChatServer actor and spawns one
//! connection task per accepted socket.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::server::{ChatServer, ServerCommand};

/// Bind `config.listen_addr` and serve until Ctrl-C
pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: config.listen_addr,
            source,
        })?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Interrupt received");
    };

    serve(listener, config, shutdown).await
}

/// Accept connections on `listener` until `shutdown` resolves
///
/// Accept errors are logged and never stop the loop. On shutdown the
/// actor is told to drop every client and this waits for it to finish.
pub async fn serve<F>(listener: TcpListener, config: ServerConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    info!(
        "Listening on {} with command queue depth {}",
        local_addr, config.queue_depth
    );

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(config.queue_depth);
    let server = tokio::spawn(ChatServer::new(cmd_rx).run());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let cmd_tx = cmd_tx.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, cmd_tx, config).await {
                            warn!("Connection handler error for {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    info!("No longer accepting connections");
    if cmd_tx.send(ServerCommand::Shutdown).await.is_err() {
        warn!("ChatServer already stopped");
    }
    drop(cmd_tx);

    if let Err(e) = server.await {
        error!("ChatServer task failed: {}", e);
    }

    Ok(())
}
