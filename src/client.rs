//! Client struct definition
//!
//! Represents a classified connection owned by the registry.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::types::{ClientId, Role};

/// Connected client information
///
/// Holds the connection, the role assigned by the handshake and,
/// for messengers only, the display name.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Remote endpoint, used for logging
    pub peer_addr: SocketAddr,
    /// Assigned role
    pub role: Role,
    /// Display name (Some iff role is Messenger)
    name: Option<String>,
    /// Duplex byte stream
    stream: TcpStream,
}

impl Client {
    /// Create a viewer record
    pub fn viewer(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            id: ClientId::new(),
            peer_addr,
            role: Role::Viewer,
            name: None,
            stream,
        }
    }

    /// Create a messenger record with its display name
    pub fn messenger(stream: TcpStream, peer_addr: SocketAddr, name: String) -> Self {
        Self {
            id: ClientId::new(),
            peer_addr,
            role: Role::Messenger,
            name: Some(name),
            stream,
        }
    }

    /// Display name of a messenger, `None` for viewers
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the display name for logging
    ///
    /// Returns the messenger name if set, otherwise the peer address.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.peer_addr.to_string(),
        }
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Close the connection
    ///
    /// Errors are ignored: the peer may already be gone.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.peer_addr, e);
        }
    }
}

/// Connected loopback stream pair for socket-backed tests: (server side, client side)
#[cfg(test)]
pub(crate) async fn socket_pair() -> (TcpStream, SocketAddr, TcpStream) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let remote = TcpStream::connect(addr).await.unwrap();
    let (local, peer_addr) = listener.accept().await.unwrap();
    (local, peer_addr, remote)
}
