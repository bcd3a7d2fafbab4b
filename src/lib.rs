//! # dmxvisor
//!
//! **dmxvisor** supervises an external worker process that owns a serial
//! device and speaks a line-delimited text protocol on its standard streams,
//! turning that fragile, single-shot conversation into a small set of
//! reliable, timeout-bounded operations with automatic recovery.
//!
//! The worker does the actual device I/O; this crate owns its lifecycle:
//! launch and handshake, one-frame-at-a-time request/response with per
//! exchange timeouts, deliberate termination, and relaunch after a crash.
//!
//! ## Architecture
//! ```text
//!   caller ──► Relay (handle) ──► actor task
//!                                   │ owns: process handle, ready/failed,
//!                                   │       pending slot, deadlines
//!                                   ▼
//!                              worker process
//!                            stdin ◄── "0,128,255\n"
//!                            stdout ──► "ready" / "OK:3" / "error:device"
//!                            stderr ──► captured for failure reports
//!
//!   lifecycle events ──► Bus ──► SubscriberSet ──► your sinks
//! ```
//!
//! ## Operations
//! | Operation                 | Resolves with                                  |
//! |---------------------------|------------------------------------------------|
//! | [`Relay::start`]          | `Ok(())` after the `ready` handshake           |
//! | [`Relay::status`]         | `true` while a handshaken worker is live       |
//! | [`Relay::send`]           | acknowledged channel count                     |
//! | [`Relay::stop`]           | `Ok(())` after the confirmed exit              |
//!
//! Every expected failure arrives as a typed error ([`StartError`],
//! [`SendError`], [`StopError`]) delivered exactly once to the call that
//! triggered it. Failures outside any pending call (a crash long after
//! `start` resolved) surface as [`Event`]s and drive the
//! [`RespawnPolicy`].
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use dmxvisor::{Relay, RelayConfig, RespawnPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = RelayConfig::default();
//!     cfg.device = "/dev/ttyACM0".into();
//!     cfg.command = "./dmx-serial-relay.py".into();
//!     cfg.respawn = RespawnPolicy::OnCrash { delay: Duration::from_secs(1) };
//!
//!     let relay = Relay::new(cfg);
//!     relay.start().await?;
//!
//!     // Three channels: full off, half, full on.
//!     let sent = relay.send(&[0, 128, 255]).await?;
//!     assert_eq!(sent, 3);
//!
//!     relay.stop(false).await?;
//!     relay.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.

mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use config::RelayConfig;
pub use crate::core::{Relay, RelayBuilder, MAX_CHANNELS};
pub use error::{SendError, StartError, StopError};
pub use events::{Bus, Event, EventKind};
pub use policies::RespawnPolicy;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
