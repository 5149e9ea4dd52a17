//! Viewer/Messenger TCP Chat Relay Library
//!
//! A minimal text chat relay over raw TCP built on tokio. Messengers send
//! text, viewers receive every messenger's text.
//!
//! # Protocol
//! - A client's first bytes are its handshake: `viewer` or `name:<name>`.
//!   Anything else, or a name already in use, gets the connection closed.
//! - Viewers are greeted with `Welcome to the "<chat name>" Chat Server!`.
//! - Messenger text is broadcast to viewers as `<name>: <text>`; join
//!   notices are broadcast as bare text.
//! - No framing: one broadcast is whatever a messenger sent since the
//!   previous tick, so lines may arrive merged or split.
//!
//! # Architecture
//! A single `ChatServer` task owns all state and runs a fixed-period tick:
//! - accept and classify one pending connection (`handler`)
//! - reap disconnected clients (`detector`)
//! - collect messenger input and flush it to viewers (`broadcast`)
//!
//! No locks needed - everything runs on the one task. `ServerHandle`
//! requests a cooperative shutdown from other tasks.
//!
//! # Example
//! ```ignore
//! use tcp_chat_relay::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::new(ServerConfig::new("Bad IRC", 6000));
//!     let handle = server.handle();
//!
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         handle.shutdown();
//!     });
//!
//!     server.run().await.unwrap();
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use broadcast::OutboundQueue;
pub use client::Client;
pub use config::ServerConfig;
pub use error::{HandshakeError, RegistryError, ServerError, SessionError};
pub use handler::handle_connection;
pub use message::{Handshake, PendingMessage};
pub use registry::Registry;
pub use server::{ChatServer, ServerHandle};
pub use session::{MessengerSession, ViewerSession};
pub use types::{ClientId, Role};
