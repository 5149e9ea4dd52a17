//! Viewer/Messenger TCP Chat Relay - Entry Point
//!
//! Starts the ChatServer and wires Ctrl+C to a graceful shutdown.
//!
//! Usage: `tcp_chat_relay [chat_name] [port]`

use std::env;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tcp_chat_relay::config::{DEFAULT_CHAT_NAME, DEFAULT_PORT};
use tcp_chat_relay::{ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=tcp_chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tcp_chat_relay=info")),
        )
        .init();

    // Get chat name and port from command line or use defaults
    let mut args = env::args().skip(1);
    let chat_name = args
        .next()
        .unwrap_or_else(|| DEFAULT_CHAT_NAME.to_string());
    let port = match args.next() {
        Some(port) => port.parse::<u16>()?,
        None => DEFAULT_PORT,
    };

    let server = ChatServer::new(ServerConfig::new(chat_name, port));
    let handle = server.handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => handle.shutdown(),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    info!("Press Ctrl+C to shut down");
    server.run().await?;

    Ok(())
}
