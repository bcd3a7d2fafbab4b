//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that gives the
//! supervisor a non-blocking publish side and hands independent receivers to
//! anyone interested in the worker's lifecycle.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or awaits.
//! - **Bounded capacity**: one ring buffer of recent events for all receivers.
//! - **Lag handling**: slow receivers observe `RecvError::Lagged(n)` and skip
//!   the `n` oldest events.
//! - **No persistence**: events published with no live receiver are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for supervisor lifecycle events.
///
/// Cheap to clone (the sender is `Arc`-backed); multiple receivers each get
/// a clone of every event published after they subscribed.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped; this still returns
    /// immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::RelayReady));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::RelayReady);
    }

    #[test]
    fn capacity_is_clamped() {
        // Capacity 0 would panic inside broadcast::channel; the clamp keeps
        // construction total.
        let _bus = Bus::new(0);
    }
}
