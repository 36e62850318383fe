//! Multi-room TCP Chat - Entry Point
//!
//! With no positional argument runs the server; with any positional
//! argument runs the terminal client against the same address.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roomchat::{run, run_client, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=roomchat=trace
    // The client stays quiet by default so logs don't mix with chat output
    let default_filter = if cli.is_client() {
        "roomchat=warn"
    } else {
        "roomchat=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.is_client() {
        run_client(cli.dial_addr(), &cli.room).await?;
    } else {
        run(cli.server_config()).await?;
        info!("Server stopped");
    }

    Ok(())
}
