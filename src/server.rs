//! ChatServer tick loop
//!
//! A single task owns the registry and the outbound queue and drives a
//! fixed-period loop: accept and classify at most one pending connection,
//! reap disconnected clients, collect messenger input, broadcast to
//! viewers, sleep. Nothing is shared, so no locks are needed; each tick
//! collects everything before broadcasting anything.

use std::io;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::broadcast::{self, OutboundQueue};
use crate::config::ServerConfig;
use crate::detector;
use crate::error::ServerError;
use crate::handler::handle_connection;
use crate::registry::Registry;
use crate::types::Role;

/// Cloneable control handle for a `ChatServer`
///
/// Passed to signal handlers instead of a global server reference.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: Arc<watch::Sender<bool>>,
    running: watch::Receiver<bool>,
}

impl ServerHandle {
    /// Request shutdown
    ///
    /// Observed at the top of the next tick. Safe to call at any time,
    /// any number of times, including before the server runs.
    pub fn shutdown(&self) {
        let first = self.shutdown.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        });
        if first {
            info!("Shutting down the server");
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Whether the server loop is currently running
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

/// The chat relay server
///
/// `run`/`serve` consume the server: one Stopped → Running → Stopped
/// cycle per instance.
pub struct ChatServer {
    config: ServerConfig,
    registry: Registry,
    queue: OutboundQueue,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    running_tx: watch::Sender<bool>,
    running_rx: watch::Receiver<bool>,
}

impl ChatServer {
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (running_tx, running_rx) = watch::channel(false);
        Self {
            config,
            registry: Registry::new(),
            queue: OutboundQueue::new(),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            running_tx,
            running_rx,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a control handle. Handles stay usable after the server stops.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: Arc::clone(&self.shutdown_tx),
            running: self.running_rx.clone(),
        }
    }

    /// Bind the configured port on all interfaces and serve until shutdown
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    ///
    /// Every client is closed before this returns, on success and on a
    /// fatal accept error alike. The listener is closed on return.
    pub async fn serve(mut self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(
            "Starting the \"{}\" TCP Chat Server on {}",
            self.config.chat_name, local_addr
        );

        self.running_tx.send_replace(true);

        let mut result = Ok(());
        while !*self.shutdown_rx.borrow() {
            if let Err(e) = self.tick(&listener).await {
                error!("Listener failed: {}", e);
                result = Err(e);
                break;
            }
            self.sleep().await;
        }

        self.close_all().await;
        drop(listener);
        self.running_tx.send_replace(false);

        info!("Server is shut down");
        result
    }

    /// One iteration of the loop
    async fn tick(&mut self, listener: &TcpListener) -> Result<(), ServerError> {
        self.accept_pending(listener).await?;
        self.reap_disconnected().await;

        broadcast::collect_inbound(&self.registry, &mut self.queue, self.config.buffer_size);
        if !self.queue.is_empty() {
            let delivered = broadcast::flush(&mut self.registry, &mut self.queue).await;
            debug!("Broadcast sweep delivered {} writes", delivered);
        }
        Ok(())
    }

    /// Accept and classify one connection if one is pending
    async fn accept_pending(&mut self, listener: &TcpListener) -> Result<(), ServerError> {
        let Some(accepted) = listener.accept().now_or_never() else {
            return Ok(());
        };

        match accepted {
            Ok((stream, peer_addr)) => {
                info!("New connection from {}", peer_addr);
                if let Ok(id) = handle_connection(
                    stream,
                    peer_addr,
                    &mut self.registry,
                    &mut self.queue,
                    &self.config,
                )
                .await
                {
                    debug!(
                        "Client {} registered. Viewers: {}, Messengers: {}",
                        id,
                        self.registry.count(Role::Viewer),
                        self.registry.count(Role::Messenger)
                    );
                }
                Ok(())
            }
            Err(e) if is_connection_error(&e) => {
                warn!("Failed to accept connection: {}", e);
                Ok(())
            }
            Err(e) => Err(ServerError::Accept(e)),
        }
    }

    /// Unregister and close every client whose peer has gone away
    async fn reap_disconnected(&mut self) {
        for id in self.registry.ids() {
            let gone = self
                .registry
                .get(id)
                .is_some_and(|client| detector::is_disconnected(client.stream()));
            if !gone {
                continue;
            }

            if let Some(client) = self.registry.unregister(id) {
                info!("{} {} has left", client.role, client.display_name());
                client.close().await;
            }
        }
    }

    /// Wait one tick period, waking early on a shutdown request
    async fn sleep(&mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.tick) => {}
            _ = self.shutdown_rx.changed() => {}
        }
    }

    /// Force-close every registered client
    async fn close_all(&mut self) {
        let clients = self.registry.drain();
        debug!("Closing {} clients", clients.len());
        for client in clients {
            client.close().await;
        }
    }
}

/// Accept errors that concern only the pending connection, not the listener
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_shutdown_idempotent() {
        let server = ChatServer::new(ServerConfig::default());
        let handle = server.handle();

        assert!(!handle.is_shutdown_requested());
        handle.shutdown();
        handle.shutdown();
        assert!(handle.is_shutdown_requested());
        assert!(!handle.is_running());
    }

    #[test]
    fn test_connection_error_kinds() {
        assert!(is_connection_error(&io::Error::from(
            io::ErrorKind::ConnectionAborted
        )));
        assert!(!is_connection_error(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
    }

    #[tokio::test]
    async fn test_run_fails_on_taken_port() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = ChatServer::new(ServerConfig::new("TestChat", port));
        let handle = server.handle();

        let result = server.run().await;

        assert!(matches!(result, Err(ServerError::Bind { .. })));
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_serve_stops_after_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = ChatServer::new(
            ServerConfig::new("TestChat", 0).with_tick(Duration::from_millis(5)),
        );
        let handle = server.handle();
        let task = tokio::spawn(server.serve(listener));

        for _ in 0..100 {
            if handle.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(handle.is_running());

        handle.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();

        assert!(result.is_ok());
        assert!(!handle.is_running());
    }
}
