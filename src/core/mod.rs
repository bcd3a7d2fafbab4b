//! The supervisor core: framing, protocol, process lifecycle, and the actor
//! that ties them together behind the [`Relay`] handle.
//!
//! ## Wiring
//! ```text
//! Relay (handle, Clone) ── Command ──► RelayActor (one task, owns all state)
//!                                          │
//!                  ┌───────────────────────┼──────────────────────┐
//!                  ▼                       ▼                      ▼
//!            RelayProcess            Pending slot            respawn timer
//!            (spawn/kill/wait)       (handshake | ack         (RespawnPolicy)
//!                  │                  vs deadline)
//!         stdout ──► LineBuffer ──► WorkerLine (generation-tagged) ──► actor
//!         stderr ──► accumulator (reported with failures/exits)
//!
//!            actor ── Event ──► Bus ──► listener ──► SubscriberSet
//! ```

mod actor;
mod framing;
mod pending;
mod process;
mod protocol;
mod supervisor;

pub use protocol::MAX_CHANNELS;
pub use supervisor::{Relay, RelayBuilder};
