//! Client sessions
//!
//! Messenger and viewer sides of the protocol, used by the interactive
//! binaries and by tests.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::config::DEFAULT_BUFFER_SIZE;
use crate::detector;
use crate::error::SessionError;
use crate::message::Handshake;

/// Time given to the server to classify a messenger before checking
/// whether it closed the connection
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// A connected messenger
#[derive(Debug)]
pub struct MessengerSession {
    name: String,
    stream: TcpStream,
}

impl MessengerSession {
    /// Connect and register under `name`
    ///
    /// The server never explains a rejection, it only closes the
    /// connection, so a closed socket after `settle` means the name was
    /// refused (usually because it is already in use).
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        name: &str,
        settle: Duration,
    ) -> Result<Self, SessionError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(SessionError::Connect)?;
        info!("Connected to the server at {}", peer_label(&stream));

        let handshake = Handshake::Messenger {
            name: name.to_string(),
        };
        stream.write_all(handshake.encode().as_bytes()).await?;

        tokio::time::sleep(settle).await;
        if detector::is_disconnected(&stream) {
            debug!("Server closed the connection after the handshake");
            return Err(SessionError::Rejected);
        }

        Ok(Self {
            name: name.to_string(),
            stream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send chat text as-is; the server does no framing
    pub async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        self.stream.write_all(text.as_bytes()).await?;
        Ok(())
    }

    pub fn is_disconnected(&self) -> bool {
        detector::is_disconnected(&self.stream)
    }

    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}

/// A connected viewer
#[derive(Debug)]
pub struct ViewerSession {
    stream: TcpStream,
    buffer_size: usize,
}

impl ViewerSession {
    /// Connect as a viewer
    ///
    /// Returns the session and the welcome text from the server.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<(Self, String), SessionError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(SessionError::Connect)?;
        info!("Connected to the server at {}", peer_label(&stream));

        stream
            .write_all(Handshake::Viewer.encode().as_bytes())
            .await?;

        let mut session = Self {
            stream,
            buffer_size: DEFAULT_BUFFER_SIZE,
        };
        match session.recv().await? {
            Some(welcome) => Ok((session, welcome)),
            None => Err(SessionError::Rejected),
        }
    }

    /// Wait for the next chunk of broadcast text
    ///
    /// A chunk may hold several broadcasts or part of one. `None` once the
    /// server closed the connection.
    pub async fn recv(&mut self) -> Result<Option<String>, SessionError> {
        let mut buf = vec![0u8; self.buffer_size];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
    }

    /// Whatever broadcast text is available right now, without waiting
    pub fn poll_messages(&self) -> Result<Option<String>, SessionError> {
        let mut collected = Vec::new();
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            match self.stream.try_read(&mut buf) {
                Ok(0) => break,
                Ok(n) => collected.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        if collected.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&collected).into_owned()))
        }
    }

    pub fn is_disconnected(&self) -> bool {
        detector::is_disconnected(&self.stream)
    }

    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}

fn peer_label(stream: &TcpStream) -> String {
    stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
