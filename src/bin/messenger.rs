//! Interactive messenger
//!
//! Reads lines from stdin and sends each one to the relay.
//! `quit` or `exit` disconnects.
//!
//! Usage: `messenger [name] [host:port]`

use std::env;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tcp_chat_relay::session::DEFAULT_SETTLE;
use tcp_chat_relay::{MessengerSession, SessionError};

/// Default relay address
const DEFAULT_ADDR: &str = "127.0.0.1:6000";

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tcp_chat_relay=warn")),
        )
        .init();

    let mut args = env::args().skip(1);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let name = match args.next() {
        Some(name) => name,
        None => {
            prompt("Enter a name to use: ");
            lines.next_line().await?.unwrap_or_default()
        }
    };
    let addr = args.next().unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let mut session = match MessengerSession::connect(&addr, &name, DEFAULT_SETTLE).await {
        Ok(session) => session,
        Err(SessionError::Rejected) => {
            println!("The server rejected us; \"{}\" is probably in use.", name);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    info!("Registered as {}", session.name());

    loop {
        prompt(&format!("{}> ", session.name()));
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let lowered = line.to_lowercase();
        if lowered == "quit" || lowered == "exit" {
            println!("Disconnecting from the server");
            break;
        }
        if line.is_empty() {
            continue;
        }

        session.send(&line).await?;

        if session.is_disconnected() {
            println!("Server has disconnected from us.");
            return Ok(());
        }
    }

    session.close().await;
    println!("Disconnected");
    Ok(())
}
