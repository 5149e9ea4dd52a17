//! Message broadcaster
//!
//! Once per tick: drain whatever each messenger sent since the last tick,
//! queue it tagged with the sender's name, then write the whole queue to
//! every viewer. Whatever arrived since the last tick is one broadcast
//! unit; there is no reassembly of split or merged lines.

use std::collections::VecDeque;
use std::io;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::message::PendingMessage;
use crate::registry::Registry;
use crate::types::Role;

/// Ordered queue of messages waiting for the next sweep
#[derive(Debug, Default)]
pub struct OutboundQueue {
    messages: VecDeque<PendingMessage>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: PendingMessage) {
        self.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take every queued message in insertion order, leaving the queue empty
    pub fn take_all(&mut self) -> Vec<PendingMessage> {
        self.messages.drain(..).collect()
    }
}

/// Read every byte currently available on `stream` without waiting
///
/// Stops at the first `WouldBlock` or at end of stream.
fn read_available(stream: &TcpStream, buffer_size: usize) -> io::Result<Vec<u8>> {
    let mut collected = Vec::new();
    let mut buf = vec![0u8; buffer_size];
    loop {
        match stream.try_read(&mut buf) {
            Ok(0) => break,
            Ok(n) => collected.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }
    Ok(collected)
}

/// Queue pending inbound text from every messenger
///
/// Returns the number of messages queued. Read failures are logged and
/// left to the next disconnect pass.
pub fn collect_inbound(
    registry: &Registry,
    queue: &mut OutboundQueue,
    buffer_size: usize,
) -> usize {
    let mut queued = 0;
    for messenger in registry.iter_role(Role::Messenger) {
        let bytes = match read_available(messenger.stream(), buffer_size) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Read from {} failed: {}", messenger.display_name(), e);
                continue;
            }
        };
        if bytes.is_empty() {
            continue;
        }

        let name = messenger.name().unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes);
        debug!("{} sent {} bytes", name, bytes.len());
        queue.push(PendingMessage::chat(name, text));
        queued += 1;
    }
    queued
}

/// Write every queued message to every viewer, then clear the queue
///
/// Messages go out in queue order, viewers in registration order. A
/// failed write skips that viewer only; nothing is retried. Returns the
/// number of successful writes.
pub async fn flush(registry: &mut Registry, queue: &mut OutboundQueue) -> usize {
    let messages = queue.take_all();
    let mut delivered = 0;

    for message in &messages {
        let bytes = message.encode();
        for viewer in registry.iter_role_mut(Role::Viewer) {
            match viewer.stream_mut().write_all(&bytes).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Write to viewer {} failed: {}", viewer.peer_addr, e);
                }
            }
        }
    }

    delivered
}
