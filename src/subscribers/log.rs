//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [spawned] pid=Some(4242)
//! [ready]
//! [exited] code=Some(3) signal=None stderr="open failed"
//! [respawn-scheduled] delay=1000ms
//! [acked] bytes=3
//! [terminated]
//! ```
//!
//! Not intended for production use — implement a custom
//! [`Subscribe`](crate::Subscribe) for structured logging or metrics.

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber, enabled via the `logging` feature.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RelaySpawned => println!("[spawned] pid={:?}", e.pid),
            EventKind::RelayReady => println!("[ready]"),
            EventKind::SpawnFailed => println!("[spawn-failed] reason={:?}", e.reason),
            EventKind::HandshakeFailed => println!("[handshake-failed] reason={:?}", e.reason),
            EventKind::RelayExited => println!(
                "[exited] code={:?} signal={:?} stderr={:?}",
                e.code, e.signal, e.reason
            ),
            EventKind::RespawnScheduled => {
                println!("[respawn-scheduled] delay={:?}ms", e.delay_ms)
            }
            EventKind::RelayTerminated => println!("[terminated]"),
            EventKind::FrameAcked => println!("[acked] bytes={:?}", e.bytes),
            EventKind::SendFailed => println!("[send-failed] reason={:?}", e.reason),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
