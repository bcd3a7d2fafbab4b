//! # SubscriberSet: non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] distributes each [`Event`] to every subscriber without
//! awaiting any of them.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO delivery (queue order).
//! - A panicking subscriber is isolated; it cannot take down the supervisor.
//!
//! ## What it does **not** guarantee
//! - Delivery under overflow: a full queue drops the event for that
//!   subscriber (with a warning on stderr).
//!
//! ```text
//!    emit(&Event)
//!        │                  (Arc-clone per subscriber)
//!        ├────────► [queue S1] ─► worker S1 ─► on_event()
//!        └────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::Event;

use super::Subscribe;

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    queues: Vec<(&'static str, mpsc::Sender<Arc<Event>>)>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut queues = Vec::with_capacity(subscribers.len());
        let mut workers = Vec::with_capacity(subscribers.len());

        for sub in subscribers {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

            workers.push(tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        eprintln!("[dmxvisor] subscriber '{}' panicked: {panic:?}", sub.name());
                    }
                }
            }));
            queues.push((name, tx));
        }

        Self { queues, workers }
    }

    /// Fans one event out to all subscribers (non-blocking).
    ///
    /// When a subscriber's queue is full or its worker is gone, the event is
    /// dropped for that subscriber and a warning names it.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for (name, tx) in &self.queues {
            match tx.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    eprintln!("[dmxvisor] subscriber '{name}' dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    eprintln!("[dmxvisor] subscriber '{name}' dropped event: worker closed");
                }
            }
        }
    }

    /// Graceful shutdown: closes all queues and awaits worker completion,
    /// so already-queued events are still delivered.
    pub async fn shutdown(self) {
        drop(self.queues);
        for handle in self.workers {
            let _ = handle.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }
}
