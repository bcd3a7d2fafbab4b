//! # Relay: the public supervisor handle.
//!
//! [`Relay`] is a cheap-to-clone handle to one supervisor actor. Building it
//! spawns the actor task (and, when subscribers are attached, a listener
//! that fans bus events out to them); the handle's methods are thin
//! message/reply round-trips into the actor.
//!
//! All operations are asynchronous and resolve typed results; none of them
//! panics or throws for an expected failure mode. Serializing calls is the
//! caller's concern only insofar as a second `send` racing a pending one
//! resolves [`SendError::Busy`].
//!
//! ## Example
//! ```no_run
//! use dmxvisor::{Relay, RelayConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let relay = Relay::new(RelayConfig::default());
//! relay.start().await?;
//! let sent = relay.send(&[0, 128, 255]).await?;
//! assert_eq!(sent, 3);
//! relay.stop(false).await?;
//! relay.shutdown();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::core::actor::{Command, RelayActor};
use crate::error::{SendError, StartError, StopError};
use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Handle to one supervised relay worker.
///
/// Clones share the same actor; dropping every clone (or calling
/// [`Relay::shutdown`]) stops the actor and kills any live worker.
#[derive(Clone)]
pub struct Relay {
    commands: mpsc::Sender<Command>,
    bus: Bus,
    token: CancellationToken,
}

impl Relay {
    /// Builds a supervisor with no subscribers.
    ///
    /// Must be called within a Tokio runtime (the actor task is spawned
    /// here).
    pub fn new(cfg: RelayConfig) -> Self {
        Self::builder(cfg).build()
    }

    /// Starts configuring a supervisor.
    pub fn builder(cfg: RelayConfig) -> RelayBuilder {
        RelayBuilder {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Launches the worker and waits for its handshake.
    ///
    /// A no-op success when a worker already exists. Resolves once the
    /// worker reported `ready`, or with the [`StartError`] describing why it
    /// never did.
    pub async fn start(&self) -> Result<(), StartError> {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Start { reply: tx })
            .await
            .is_err()
        {
            return Err(StartError::Interrupted);
        }
        rx.await.unwrap_or(Err(StartError::Interrupted))
    }

    /// Whether the supervisor has a live, handshaken, non-failed worker.
    ///
    /// A pure read: no waiting beyond the actor round-trip, no side effects.
    /// `false` once the actor is gone.
    pub async fn status(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Status { reply: tx })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Writes one frame of channel values and waits for the worker's
    /// acknowledgement. Resolves with the acknowledged channel count.
    ///
    /// The frame must hold `1..=MAX_CHANNELS` values; the `u8` element type
    /// already guarantees the 0–255 range. At most one exchange may be in
    /// flight: a `send` racing a pending one resolves [`SendError::Busy`].
    pub async fn send(&self, channels: &[u8]) -> Result<usize, SendError> {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Send {
                channels: channels.to_vec(),
                reply: tx,
            })
            .await
            .is_err()
        {
            return Err(SendError::Interrupted);
        }
        rx.await.unwrap_or(Err(SendError::Interrupted))
    }

    /// Terminates the worker and waits for the confirmed exit.
    ///
    /// A no-op success when no worker exists. With `respawn`, a fresh launch
    /// is kicked off fire-and-forget right after the exit confirmation; its
    /// outcome surfaces only as events.
    pub async fn stop(&self, respawn: bool) -> Result<(), StopError> {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Stop { respawn, reply: tx })
            .await
            .is_err()
        {
            return Err(StopError::Interrupted);
        }
        rx.await.unwrap_or(Err(StopError::Interrupted))
    }

    /// Creates a receiver observing subsequent lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Shuts the supervisor down: the actor exits and any live worker is
    /// killed. Calls pending at that moment resolve `Interrupted`.
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

/// Builder for [`Relay`].
pub struct RelayBuilder {
    cfg: RelayConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RelayBuilder {
    /// Attaches one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Attaches a batch of subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Spawns the actor (and the subscriber listener, when any subscribers
    /// are attached) and returns the handle.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> Relay {
        let bus = Bus::new(self.cfg.bus_capacity);
        let token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers);
            let mut rx = bus.subscribe();
            let listener_token = token.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = listener_token.cancelled() => break,
                        ev = rx.recv() => match ev {
                            Ok(ev) => set.emit(&ev),
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => break,
                        },
                    }
                }
                // Drain already-queued events before the workers go away.
                set.shutdown().await;
            });
        }

        let (commands, commands_rx) = mpsc::channel(16);
        let actor = RelayActor::new(self.cfg, bus.clone(), commands_rx, token.clone());
        tokio::spawn(actor.run());

        Relay {
            commands,
            bus,
            token,
        }
    }
}
