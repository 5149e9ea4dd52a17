//! Disconnect detection
//!
//! A connection is gone when it reports readable but a peek yields zero
//! bytes (peer closed), or when the peek itself fails.

use futures_util::FutureExt;
use tokio::net::TcpStream;
use tracing::debug;

/// Check whether the peer of `stream` has disconnected
///
/// Never waits and never consumes data. A stream with no readiness
/// reported yet, or with bytes pending, is alive.
pub fn is_disconnected(stream: &TcpStream) -> bool {
    let mut probe = [0u8; 1];
    match stream.peek(&mut probe).now_or_never() {
        None => false,
        Some(Ok(0)) => true,
        Some(Ok(_)) => false,
        Some(Err(e)) => {
            debug!("Disconnect probe failed: {}", e);
            true
        }
    }
}
