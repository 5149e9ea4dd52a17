//! Connection handshake handler
//!
//! Classifies a newly accepted TCP connection as a viewer or a messenger
//! from its first read, registers it, or closes it.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::broadcast::OutboundQueue;
use crate::client::Client;
use crate::config::ServerConfig;
use crate::error::HandshakeError;
use crate::message::{welcome_line, Handshake, PendingMessage};
use crate::registry::Registry;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs exactly one read of at most `buffer_size` bytes and decides:
/// - `viewer`: welcome line is written back, client registered.
/// - `name:<name>` with a free, non-empty name: client registered and a
///   join notice queued for the next sweep.
/// - anything else: the connection is closed.
///
/// A duplicate name is dropped silently: the client only sees the
/// connection close, never a reason.
pub async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    registry: &mut Registry,
    queue: &mut OutboundQueue,
    config: &ServerConfig,
) -> Result<ClientId, HandshakeError> {
    debug!("New TCP connection from {}", peer_addr);

    let handshake = match read_handshake(&mut stream, config).await {
        Ok(handshake) => handshake,
        Err(e) => return reject(stream, peer_addr, e).await,
    };

    match handshake {
        Handshake::Viewer => {
            let welcome = welcome_line(&config.chat_name);
            if let Err(e) = stream.write_all(welcome.as_bytes()).await {
                return reject(stream, peer_addr, e.into()).await;
            }

            let id = registry.register(Client::viewer(stream, peer_addr))?;
            info!("{} is a Viewer", peer_addr);
            Ok(id)
        }
        Handshake::Messenger { name } => {
            if registry.is_name_taken(&name) {
                return reject(stream, peer_addr, HandshakeError::DuplicateName(name)).await;
            }

            let id = registry.register(Client::messenger(stream, peer_addr, name.clone()))?;
            info!("{} is a Messenger with the name {}", peer_addr, name);
            queue.push(PendingMessage::join(&name));
            Ok(id)
        }
    }
}

/// Single read of the handshake payload, bounded by the optional timeout
async fn read_handshake(
    stream: &mut TcpStream,
    config: &ServerConfig,
) -> Result<Handshake, HandshakeError> {
    let mut buf = vec![0u8; config.buffer_size];

    let n = match config.handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, stream.read(&mut buf))
            .await
            .map_err(|_| HandshakeError::TimedOut)??,
        None => stream.read(&mut buf).await?,
    };

    Handshake::parse(&buf[..n])
}

/// Close a connection that failed its handshake
async fn reject(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    err: HandshakeError,
) -> Result<ClientId, HandshakeError> {
    warn!("{} is not identified: {}", peer_addr, err);
    let _ = stream.shutdown().await;
    Err(err)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::socket_pair;
    use crate::types::Role;

    fn config() -> ServerConfig {
        ServerConfig::new("TestChat", 0)
    }

    async fn classify(
        payload: &[u8],
        registry: &mut Registry,
        queue: &mut OutboundQueue,
    ) -> (Result<ClientId, HandshakeError>, TcpStream) {
        let (stream, addr, mut remote) = socket_pair().await;
        if payload.is_empty() {
            remote.shutdown().await.unwrap();
        } else {
            remote.write_all(payload).await.unwrap();
        }
        let result = handle_connection(stream, addr, registry, queue, &config()).await;
        (result, remote)
    }

    async fn read_to_end(remote: &mut TcpStream) -> Vec<u8> {
        let mut out = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), remote.read_to_end(&mut out))
            .await
            .unwrap()
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_viewer_gets_welcome() {
        let mut registry = Registry::new();
        let mut queue = OutboundQueue::new();

        let (result, mut remote) = classify(b"viewer", &mut registry, &mut queue).await;

        assert!(result.is_ok());
        assert_eq!(registry.count(Role::Viewer), 1);
        assert!(queue.is_empty());

        let expected = b"Welcome to the \"TestChat\" Chat Server!";
        let mut buf = vec![0u8; expected.len()];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf[..], &expected[..]);
    }

    #[tokio::test]
    async fn test_messenger_queues_join_notice() {
        let mut registry = Registry::new();
        let mut queue = OutboundQueue::new();

        let (result, _remote) = classify(b"name:alice", &mut registry, &mut queue).await;

        let id = result.unwrap();
        assert_eq!(registry.get(id).and_then(|c| c.name()), Some("alice"));
        assert_eq!(
            queue.take_all(),
            vec![PendingMessage::system(
                "A new Messenger has joined the chat: alice"
            )]
        );
    }

    #[tokio::test]
    async fn test_duplicate_name_closed_silently() {
        let mut registry = Registry::new();
        let mut queue = OutboundQueue::new();

        let (first, _remote1) = classify(b"name:alice", &mut registry, &mut queue).await;
        assert!(first.is_ok());
        queue.take_all();

        let (second, mut remote2) = classify(b"name:alice", &mut registry, &mut queue).await;

        assert!(matches!(second, Err(HandshakeError::DuplicateName(ref n)) if n == "alice"));
        assert_eq!(registry.count(Role::Messenger), 1);
        assert!(queue.is_empty());
        assert!(read_to_end(&mut remote2).await.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_payloads_rejected() {
        let mut registry = Registry::new();
        let mut queue = OutboundQueue::new();

        for payload in [&b"hello"[..], &b"VIEWER"[..], &b"name:"[..], &b"name"[..]] {
            let (result, mut remote) = classify(payload, &mut registry, &mut queue).await;
            assert!(result.is_err(), "payload {:?} accepted", payload);
            assert!(read_to_end(&mut remote).await.is_empty());
        }

        assert!(registry.is_empty());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_empty_read_rejected() {
        let mut registry = Registry::new();
        let mut queue = OutboundQueue::new();

        let (result, _remote) = classify(b"", &mut registry, &mut queue).await;

        assert!(matches!(result, Err(HandshakeError::Empty)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let mut registry = Registry::new();
        let mut queue = OutboundQueue::new();
        let (stream, addr, _remote) = socket_pair().await;
        let config = config().with_handshake_timeout(Duration::from_millis(50));

        let result = handle_connection(stream, addr, &mut registry, &mut queue, &config).await;

        assert!(matches!(result, Err(HandshakeError::TimedOut)));
        assert!(registry.is_empty());
    }
}
