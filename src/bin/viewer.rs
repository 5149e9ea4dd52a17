//! Interactive viewer
//!
//! Prints everything the relay broadcasts until the server goes away
//! or Ctrl+C is pressed.
//!
//! Usage: `viewer [host:port]`

use std::env;

use tracing_subscriber::EnvFilter;

use tcp_chat_relay::{SessionError, ViewerSession};

/// Default relay address
const DEFAULT_ADDR: &str = "127.0.0.1:6000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tcp_chat_relay=warn")),
        )
        .init();

    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let (mut session, welcome) = match ViewerSession::connect(&addr).await {
        Ok(connected) => connected,
        Err(SessionError::Rejected) => {
            println!("The server didn't recognise us as a Viewer.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("{}", welcome);
    println!("Press Ctrl+C to exit the Viewer at any time");

    loop {
        tokio::select! {
            received = session.recv() => match received? {
                Some(text) => println!("{}", text),
                None => {
                    println!("Server has disconnected from us.");
                    return Ok(());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Disconnecting from the chat...");
                break;
            }
        }
    }

    session.close().await;
    println!("Disconnected");
    Ok(())
}
