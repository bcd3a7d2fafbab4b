//! # Lifecycle events emitted by the supervisor.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (timestamp, worker pid, exit code/signal, reasons, delays).
//!
//! Failures that resolve a pending `start`/`send`/`stop` call are delivered
//! to that caller as typed errors, not here; events exist so that failures
//! discovered *outside* any pending call (a crash long after start resolved,
//! a scheduled respawn) are still observable, and so that a logging sink can
//! reconstruct the full lifecycle.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events from several
//! supervisors interleave.
//!
//! ## Example
//! ```rust
//! use dmxvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RelayExited)
//!     .with_exit(Some(1), None)
//!     .with_reason("device unplugged");
//!
//! assert_eq!(ev.kind, EventKind::RelayExited);
//! assert_eq!(ev.code, Some(1));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervisor lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Worker process created; handshake pending.
    ///
    /// Sets: `pid`.
    RelaySpawned,

    /// Handshake complete; the worker opened its device.
    RelayReady,

    /// The OS refused to create the worker process.
    ///
    /// Sets: `reason` (spawn error text).
    SpawnFailed,

    /// The launch reached a process but not readiness: device error,
    /// unexpected handshake text, or handshake timeout.
    ///
    /// Sets: `reason`.
    HandshakeFailed,

    /// A ready worker exited without being asked to.
    ///
    /// Sets: `code`, `signal`, `reason` (condensed stderr).
    RelayExited,

    /// The respawn policy armed a relaunch.
    ///
    /// Sets: `delay_ms`.
    RespawnScheduled,

    /// The worker exited after an explicit `stop()`.
    RelayTerminated,

    /// A frame was acknowledged with the expected channel count.
    ///
    /// Sets: `bytes`.
    FrameAcked,

    /// A frame write or its acknowledgement failed.
    ///
    /// Sets: `reason`.
    SendFailed,
}

/// A single lifecycle event with metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Global monotonic sequence number.
    pub seq: u64,
    /// Wall-clock timestamp at creation.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Worker process id, if applicable.
    pub pid: Option<u32>,
    /// Exit code, if the event describes an exit.
    pub code: Option<i32>,
    /// Terminating signal, if any (Unix only).
    pub signal: Option<i32>,
    /// Human-readable context (error text, condensed stderr).
    pub reason: Option<Arc<str>>,
    /// Acknowledged channel count, for [`EventKind::FrameAcked`].
    pub bytes: Option<usize>,
    /// Respawn delay in milliseconds, for [`EventKind::RespawnScheduled`].
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            pid: None,
            code: None,
            signal: None,
            reason: None,
            bytes: None,
            delay_ms: None,
        }
    }

    /// Attaches the worker process id.
    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches exit code and signal.
    #[inline]
    pub fn with_exit(mut self, code: Option<i32>, signal: Option<i32>) -> Self {
        self.code = code;
        self.signal = signal;
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an acknowledged channel count.
    #[inline]
    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.bytes = Some(bytes);
        self
    }

    /// Attaches a respawn delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }
}
