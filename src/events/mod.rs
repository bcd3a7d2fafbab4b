//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: the supervisor actor (one per [`Relay`](crate::Relay)).
//! - **Consumers**: the subscriber listener (fans out to the
//!   [`SubscriberSet`](crate::SubscriberSet)) and any receiver obtained via
//!   [`Relay::subscribe`](crate::Relay::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
