//! Server configuration

use std::time::Duration;

/// Default chat display name
pub const DEFAULT_CHAT_NAME: &str = "Bad IRC";

/// Default listening port
pub const DEFAULT_PORT: u16 = 6000;

/// Default per-connection read buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 2 * 1024;

/// Default tick period of the server loop
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

/// Configuration consumed by `ChatServer`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name shown in the viewer welcome line
    pub chat_name: String,
    /// TCP port bound on all interfaces by `ChatServer::run`
    pub port: u16,
    /// Upper bound of a single handshake read
    pub buffer_size: usize,
    /// Fixed period between two ticks
    pub tick: Duration,
    /// Bound on the handshake read. `None` waits for the client indefinitely.
    pub handshake_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Create a config with the given chat name and port, defaults elsewhere
    pub fn new(chat_name: impl Into<String>, port: u16) -> Self {
        Self {
            chat_name: chat_name.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Address passed to `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            chat_name: DEFAULT_CHAT_NAME.to_string(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            tick: DEFAULT_TICK,
            handshake_timeout: None,
        }
    }
}
