//! Error types for the chat relay
//!
//! Defines listener-level errors, handshake rejections, registry errors
//! and client session errors. Uses thiserror for ergonomic error definitions.

use std::io;

use thiserror::Error;

/// Server-level errors
///
/// Only listener failures are fatal. Per-connection transport errors
/// are contained at the connection and never surface here.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listening socket could not be bound (server never starts)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Listening socket failed while accepting
    #[error("Accept error: {0}")]
    Accept(#[source] io::Error),
}

/// Reasons a newly accepted connection is rejected by the handshake
///
/// A rejected connection is closed without registry mutation or broadcast.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Client closed before sending anything
    #[error("Empty handshake")]
    Empty,

    /// First payload was neither `viewer` nor `name:<name>`
    #[error("Unrecognized handshake: {0:?}")]
    Unrecognized(String),

    /// `name:` with nothing after the colon
    #[error("Empty display name")]
    EmptyName,

    /// Another registered messenger holds this name
    #[error("Display name already in use: {0}")]
    DuplicateName(String),

    /// No handshake arrived within the configured timeout
    #[error("Handshake timed out")]
    TimedOut,

    /// IO error while reading the handshake or writing the welcome line
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Client registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A messenger with this display name is already registered
    #[error("Display name already in use: {0}")]
    DuplicateName(String),
}

impl From<RegistryError> for HandshakeError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateName(name) => HandshakeError::DuplicateName(name),
        }
    }
}

/// Client session errors (messenger/viewer side)
#[derive(Debug, Error)]
pub enum SessionError {
    /// Could not open the TCP connection
    #[error("Failed to connect: {0}")]
    Connect(#[source] io::Error),

    /// The server closed the connection after the handshake
    #[error("Rejected by the server")]
    Rejected,

    /// IO error on an established session
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
