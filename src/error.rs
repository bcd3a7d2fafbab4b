//! Error types delivered by the supervisor's public operations.
//!
//! Three enums, one per operation family:
//!
//! - [`StartError`] — launching the worker and waiting for its handshake.
//! - [`SendError`] — writing a frame and waiting for its acknowledgement.
//! - [`StopError`] — terminating the worker.
//!
//! Every expected failure mode is a variant here; the supervisor never
//! panics and never reports a failure through any other channel. Each enum
//! provides `as_label()` — a short stable snake_case tag for logs/metrics.

use std::time::Duration;

use thiserror::Error;

/// # Errors resolving a [`Relay::start`](crate::Relay::start) call.
///
/// Exactly one of these is delivered per failed launch attempt; a launch
/// that reaches the `ready` handshake resolves `Ok(())` instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartError {
    /// The OS could not create the worker process at all.
    #[error("could not spawn relay worker: {source}")]
    Spawn {
        /// The underlying spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// The worker started but exited before the handshake completed.
    #[error("relay worker exited before handshake (code {code:?}, signal {signal:?})")]
    ExitedEarly {
        /// Exit code reported by the OS, if the worker exited normally.
        code: Option<i32>,
        /// Terminating signal, if any (Unix only).
        signal: Option<i32>,
        /// Everything the worker wrote to stderr before exiting.
        stderr: String,
    },

    /// The worker reported `error:device`: it could not open its target device.
    #[error("relay worker could not open its device")]
    Device {
        /// Everything the worker wrote to stderr up to the report.
        stderr: String,
    },

    /// The worker sent something other than `ready` or `error:device`.
    #[error("unexpected handshake message: {message:?}")]
    UnexpectedHandshake {
        /// The raw message received.
        message: String,
    },

    /// No handshake message arrived within the configured window.
    #[error("relay worker not ready within {timeout:?}")]
    HandshakeTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The pending launch was abandoned: `stop()` tore the worker down or
    /// the supervisor itself shut down before the handshake resolved.
    #[error("start interrupted by supervisor teardown")]
    Interrupted,
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::Spawn { .. } => "spawn",
            StartError::ExitedEarly { .. } => "spawn_exited",
            StartError::Device { .. } => "device",
            StartError::UnexpectedHandshake { .. } => "handshake_unexpected",
            StartError::HandshakeTimeout { .. } => "handshake_timeout",
            StartError::Interrupted => "interrupted",
        }
    }
}

/// # Errors resolving a [`Relay::send`](crate::Relay::send) call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SendError {
    /// No worker process exists; call `start()` first.
    #[error("relay worker is not running")]
    NotReady,

    /// Frame length outside `1..=MAX_CHANNELS`.
    #[error("frame of {len} channels outside 1..={max}", max = crate::MAX_CHANNELS)]
    InvalidFrame {
        /// The rejected frame length.
        len: usize,
    },

    /// Another operation is still awaiting its response. One command may be
    /// in flight at a time; retry after the first resolves.
    #[error("another command is awaiting its response")]
    Busy,

    /// The frame could not be written to the worker's stdin.
    #[error("could not write frame to relay worker: {source}")]
    Write {
        /// The underlying pipe failure.
        #[source]
        source: std::io::Error,
    },

    /// The worker acknowledged a different channel count than was sent.
    /// The worker is left running; retrying is the caller's choice.
    #[error("relay acknowledged {acked} of {expected} channels")]
    Corrupt {
        /// Channels in the frame that was written.
        expected: usize,
        /// Channels the worker claims to have relayed.
        acked: usize,
    },

    /// The worker replied with something that is not an `OK:<n>` message.
    #[error("unrecognized relay response: {response:?}")]
    UnknownResponse {
        /// The raw message received.
        response: String,
    },

    /// No acknowledgement arrived within the configured window. A late
    /// acknowledgement arriving afterwards is dropped.
    #[error("relay did not respond within {timeout:?}")]
    ResponseTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The worker was torn down (crash or `stop()`) while the
    /// acknowledgement was pending.
    #[error("send interrupted by worker teardown")]
    Interrupted,
}

impl SendError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SendError::NotReady => "unready",
            SendError::InvalidFrame { .. } => "frame_invalid",
            SendError::Busy => "busy",
            SendError::Write { .. } => "write",
            SendError::Corrupt { .. } => "corrupt",
            SendError::UnknownResponse { .. } => "response_unknown",
            SendError::ResponseTimeout { .. } => "response_timeout",
            SendError::Interrupted => "interrupted",
        }
    }

    /// Indicates whether simply reissuing the same frame may succeed.
    ///
    /// True for transient conditions ([`SendError::Busy`],
    /// [`SendError::ResponseTimeout`], [`SendError::Corrupt`]); false where a
    /// retry needs caller action first (start the worker, fix the frame).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SendError::Busy | SendError::ResponseTimeout { .. } | SendError::Corrupt { .. }
        )
    }
}

/// # Errors resolving a [`Relay::stop`](crate::Relay::stop) call.
///
/// Stopping an already-stopped supervisor is not an error.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StopError {
    /// The termination signal could not be delivered to the worker.
    #[error("could not signal relay worker to terminate: {source}")]
    Kill {
        /// The underlying signalling failure.
        #[source]
        source: std::io::Error,
    },

    /// The supervisor shut down before the stop resolved.
    #[error("stop interrupted by supervisor teardown")]
    Interrupted,
}

impl StopError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopError::Kill { .. } => "kill",
            StopError::Interrupted => "interrupted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(SendError::NotReady.as_label(), "unready");
        assert_eq!(SendError::Busy.as_label(), "busy");
        assert_eq!(
            SendError::Corrupt {
                expected: 3,
                acked: 2
            }
            .as_label(),
            "corrupt"
        );
        assert_eq!(StartError::Interrupted.as_label(), "interrupted");
        assert_eq!(
            StartError::HandshakeTimeout {
                timeout: Duration::from_millis(500)
            }
            .as_label(),
            "handshake_timeout"
        );
    }

    #[test]
    fn retryable_send_errors() {
        assert!(SendError::Busy.is_retryable());
        assert!(SendError::ResponseTimeout {
            timeout: Duration::from_millis(500)
        }
        .is_retryable());
        assert!(!SendError::NotReady.is_retryable());
        assert!(!SendError::InvalidFrame { len: 0 }.is_retryable());
    }

    #[test]
    fn display_carries_both_counts() {
        let err = SendError::Corrupt {
            expected: 512,
            acked: 17,
        };
        let text = err.to_string();
        assert!(text.contains("512"));
        assert!(text.contains("17"));
    }
}
