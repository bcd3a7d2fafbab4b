//! # The single in-flight operation slot.
//!
//! At most one protocol exchange is outstanding at any instant: either the
//! launch handshake or one frame acknowledgement. [`Pending`] is that slot as
//! a tagged state, holding the caller's reply channel and the deadline that
//! races it.
//!
//! Resolution is exactly-once by construction: the actor `take()`s the slot
//! (leaving [`Pending::Idle`]) *before* delivering either the message branch
//! or the timeout branch, so whichever loses the race finds the slot empty
//! and does nothing. Dropping a taken reply channel without sending resolves
//! the caller with `Interrupted`.

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{SendError, StartError};

/// Reply channel for a `start` call. Absent for supervisor-internal
/// relaunches (respawn policy, `stop(respawn: true)`).
pub(crate) type StartReply = oneshot::Sender<Result<(), StartError>>;

/// Reply channel for a `send` call.
pub(crate) type SendReply = oneshot::Sender<Result<usize, SendError>>;

/// The in-flight operation, if any.
pub(crate) enum Pending {
    /// Nothing outstanding; worker messages are dropped.
    Idle,
    /// A launch is waiting for the worker's handshake line.
    AwaitingHandshake {
        reply: Option<StartReply>,
        deadline: Instant,
    },
    /// A frame write is waiting for its `OK:<n>` acknowledgement.
    AwaitingAck {
        reply: SendReply,
        expected: usize,
        deadline: Instant,
    },
}

impl Pending {
    pub fn is_idle(&self) -> bool {
        matches!(self, Pending::Idle)
    }

    /// The deadline racing the in-flight operation, if one is outstanding.
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Pending::Idle => None,
            Pending::AwaitingHandshake { deadline, .. } => Some(*deadline),
            Pending::AwaitingAck { deadline, .. } => Some(*deadline),
        }
    }

    /// Clears the slot and returns what was in it.
    pub fn take(&mut self) -> Pending {
        std::mem::replace(self, Pending::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn take_leaves_idle() {
        let (tx, _rx) = oneshot::channel();
        let mut pending = Pending::AwaitingAck {
            reply: tx,
            expected: 3,
            deadline: Instant::now() + Duration::from_millis(10),
        };
        assert!(!pending.is_idle());
        assert!(pending.deadline().is_some());

        let taken = pending.take();
        assert!(pending.is_idle());
        assert!(pending.deadline().is_none());
        assert!(matches!(taken, Pending::AwaitingAck { expected: 3, .. }));
    }

    #[tokio::test]
    async fn dropping_a_taken_reply_interrupts_the_caller() {
        let (tx, rx) = oneshot::channel::<Result<usize, SendError>>();
        let mut pending = Pending::AwaitingAck {
            reply: tx,
            expected: 1,
            deadline: Instant::now(),
        };
        drop(pending.take());
        assert!(rx.await.is_err());
    }
}
